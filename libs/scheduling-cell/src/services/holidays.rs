// libs/scheduling-cell/src/services/holidays.rs

use chrono::{NaiveDate, NaiveTime};

use crate::models::{DateRange, Interval, ScheduleHoliday};

/// Clinic-wide blackout calendar. Built from the stored holiday rows on each
/// query; holds no state of its own.
pub struct HolidayCalendar {
    holidays: Vec<ScheduleHoliday>,
}

impl HolidayCalendar {
    pub fn new(holidays: Vec<ScheduleHoliday>) -> Self {
        Self { holidays }
    }

    pub fn is_blocked(&self, date: NaiveDate) -> bool {
        self.holidays.iter().any(|holiday| holiday.date.blocks(date))
    }

    /// One full-day interval per blocked date in range, used as subtraction
    /// input against nominal availability.
    pub fn blocked_intervals_for(&self, range: &DateRange) -> Vec<Interval> {
        range
            .days()
            .filter(|date| self.is_blocked(*date))
            .map(|date| {
                Interval::from_parts(
                    date.and_time(NaiveTime::MIN).and_utc(),
                    (date + chrono::Duration::days(1))
                        .and_time(NaiveTime::MIN)
                        .and_utc(),
                )
            })
            .collect()
    }
}
