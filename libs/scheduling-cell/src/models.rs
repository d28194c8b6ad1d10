// libs/scheduling-cell/src/models.rs
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// TIME PRIMITIVES
// ==============================================================================

/// A half-open time interval `[start, end)`. The constructor is the only way
/// to build one, so downstream code never sees `start >= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, SchedulingError> {
        if start >= end {
            return Err(SchedulingError::InvalidInterval(format!(
                "interval start {} must be before end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Internal constructor for intervals whose ordering was already checked.
    pub(crate) fn from_parts(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start < end);
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Inclusive calendar date range used for slot generation queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, SchedulingError> {
        if from > to {
            return Err(SchedulingError::InvalidInterval(format!(
                "date range start {} is after end {}",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    pub fn from_date(&self) -> NaiveDate {
        self.from
    }

    pub fn to_date(&self) -> NaiveDate {
        self.to
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |date| *date <= to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl DayOfWeek {
    pub fn matches(&self, date: NaiveDate) -> bool {
        DayOfWeek::from(date.weekday()) == *self
    }
}

// ==============================================================================
// CONFIGURATION ENTITIES
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleView {
    Day,
    Week,
}

/// Clinic-wide scheduling parameters. Exactly one effective config per unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub default_view: ScheduleView,
    pub block_interval_minutes: i64,
    pub working_days: Vec<DayOfWeek>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub default_type_name: String,
}

impl ScheduleConfig {
    /// The clinic's open window on a concrete date.
    pub fn window_for(&self, date: NaiveDate) -> Interval {
        Interval::from_parts(
            date.and_time(self.start_time).and_utc(),
            date.and_time(self.end_time).and_utc(),
        )
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.working_days.iter().any(|day| day.matches(date))
    }
}

/// Clinic-wide blackout date. `Recurring` blocks (day, month) every year,
/// `Specific` blocks a single calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HolidayDate {
    Recurring { day: u32, month: u32 },
    Specific { day: u32, month: u32, year: i32 },
}

impl HolidayDate {
    pub fn blocks(&self, date: NaiveDate) -> bool {
        match *self {
            HolidayDate::Recurring { day, month } => {
                date.day() == day && date.month() == month
            }
            HolidayDate::Specific { day, month, year } => {
                date.day() == day && date.month() == month && date.year() == year
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleHoliday {
    pub id: Uuid,
    pub name: String,
    #[serde(flatten)]
    pub date: HolidayDate,
}

/// A blocked sub-interval inside a rule's daily window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleException {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Recurring weekly availability template for one professional in one unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleRule {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub unit_id: Uuid,
    pub days_of_week: Vec<DayOfWeek>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub exceptions: Vec<RuleException>,
}

impl ScheduleRule {
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.days_of_week.iter().any(|day| day.matches(date))
    }

    pub fn shares_day_with(&self, other: &ScheduleRule) -> bool {
        self.days_of_week
            .iter()
            .any(|day| other.days_of_week.contains(day))
    }
}

// ==============================================================================
// SCHEDULE TYPES AND PROTOCOL SERVICES
// ==============================================================================

/// A bookable service inside a protocol-bound schedule type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolService {
    pub id: Uuid,
    pub name: String,
    pub number_of_sessions: i32,
    pub default_duration_minutes: i64,
    pub requires_scheduling: bool,
    pub requires_interval_control: bool,
    /// Minimum gap between a patient's consecutive sessions of this service.
    /// Required when `requires_interval_control` is set; validated on write.
    pub min_interval_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "schedule_type", rename_all = "lowercase")]
pub enum ScheduleTypeKind {
    Single,
    Protocol { services: Vec<ProtocolService> },
}

/// Describes a bookable appointment kind. Read-only reference data during
/// booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleType {
    pub id: Uuid,
    pub name: String,
    pub duration_minutes: i64,
    #[serde(flatten)]
    pub kind: ScheduleTypeKind,
}

impl ScheduleType {
    pub fn protocol_service(&self, service_id: Uuid) -> Option<&ProtocolService> {
        match &self.kind {
            ScheduleTypeKind::Single => None,
            ScheduleTypeKind::Protocol { services } => {
                services.iter().find(|service| service.id == service_id)
            }
        }
    }

    /// Booking duration: the bound protocol service's default when one is
    /// named, the type's own duration otherwise.
    pub fn duration_for(
        &self,
        protocol_service_id: Option<Uuid>,
    ) -> Result<i64, SchedulingError> {
        match protocol_service_id {
            None => Ok(self.duration_minutes),
            Some(service_id) => self
                .protocol_service(service_id)
                .map(|service| service.default_duration_minutes)
                .ok_or(SchedulingError::UnknownProtocolService(service_id)),
        }
    }
}

// ==============================================================================
// EVENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::Scheduled => write!(f, "scheduled"),
            EventStatus::Confirmed => write!(f, "confirmed"),
            EventStatus::Completed => write!(f, "completed"),
            EventStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A committed appointment or block. The only entity written on the booking
/// hot path; the unit of conflict detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub unit_id: Uuid,
    pub patient_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub schedule_type_id: Uuid,
    pub protocol_service_id: Option<Uuid>,
    pub status: EventStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduleEvent {
    pub fn interval(&self) -> Interval {
        Interval::from_parts(self.start_time, self.end_time)
    }

    /// Cancelled events are kept for history but never block time.
    pub fn blocks_time(&self) -> bool {
        self.status != EventStatus::Cancelled
    }
}

/// A candidate bookable interval aligned to the clinic's block grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookSlotRequest {
    pub professional_id: Uuid,
    pub unit_id: Uuid,
    pub patient_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub schedule_type_id: Uuid,
    pub protocol_service_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertConfigRequest {
    pub default_view: ScheduleView,
    pub block_interval_minutes: i64,
    pub working_days: Vec<DayOfWeek>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub default_type_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRuleRequest {
    pub professional_id: Uuid,
    pub unit_id: Uuid,
    pub days_of_week: Vec<DayOfWeek>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default)]
    pub exceptions: Vec<RuleException>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHolidayRequest {
    pub name: String,
    #[serde(flatten)]
    pub date: HolidayDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleTypeRequest {
    pub name: String,
    pub duration_minutes: i64,
    #[serde(flatten)]
    pub kind: ScheduleTypeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEventStatusRequest {
    pub status: EventStatus,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchedulingError {
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("No schedule config for unit {0}")]
    ConfigMissing(Uuid),

    #[error("Rule overlap: {0}")]
    RuleOverlap(String),

    #[error("Slot already booked")]
    SlotConflict,

    #[error("Minimum interval not met; earliest admissible date is {earliest}")]
    IntervalTooSoon { earliest: NaiveDate },

    #[error("Candidate slot is no longer available")]
    StaleSlot,

    #[error("Timed out waiting for the booking ledger")]
    Timeout,

    #[error("Unknown schedule type {0}")]
    UnknownScheduleType(Uuid),

    #[error("Unknown protocol service {0}")]
    UnknownProtocolService(Uuid),

    #[error("Event {0} not found")]
    EventNotFound(Uuid),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: EventStatus, to: EventStatus },
}
