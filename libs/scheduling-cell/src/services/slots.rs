// libs/scheduling-cell/src/services/slots.rs

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::models::{DateRange, Interval, SchedulingError, Slot};
use crate::services::calendar;
use crate::services::holidays::HolidayCalendar;
use crate::services::ledger::BookingLedger;
use crate::services::availability;
use crate::store::SchedulingStore;

/// Computes bookable slots for a professional on a date range. Read-only and
/// idempotent: the same inputs always produce the same slot list, so callers
/// may run it in parallel without coordination. The result is advisory; the
/// ledger re-checks at commit time.
#[derive(Clone)]
pub struct SlotGeneratorService {
    store: Arc<SchedulingStore>,
    ledger: Arc<BookingLedger>,
}

impl SlotGeneratorService {
    pub fn new(store: Arc<SchedulingStore>, ledger: Arc<BookingLedger>) -> Self {
        Self { store, ledger }
    }

    pub fn generate_slots(
        &self,
        professional_id: Uuid,
        unit_id: Uuid,
        range: DateRange,
        duration_minutes: i64,
    ) -> Result<Vec<Slot>, SchedulingError> {
        let config = self
            .store
            .config_for_unit(unit_id)
            .ok_or(SchedulingError::ConfigMissing(unit_id))?;

        if duration_minutes <= 0 {
            return Err(SchedulingError::InvalidInterval(format!(
                "slot duration must be positive, got {} minutes",
                duration_minutes
            )));
        }

        let rules = self.store.rules_for(professional_id, unit_id);
        let holiday_blocks =
            HolidayCalendar::new(self.store.holidays()).blocked_intervals_for(&range);
        let booked = self.ledger.blocked_intervals_for(professional_id, &range);

        // Slots always span at least one clinic block and stay on the grid.
        let slot_minutes = duration_minutes.max(config.block_interval_minutes);

        // A professional with no rules is available for the whole clinic
        // window; rules restrict availability once they exist.
        let windows: Vec<Interval> = if rules.is_empty() {
            range
                .days()
                .filter(|date| config.is_working_day(*date))
                .map(|date| config.window_for(date))
                .collect()
        } else {
            availability::windows_for(&rules, range).collect()
        };

        let mut slots = Vec::new();
        for window in windows {
            let date = window.start().date_naive();
            if !config.is_working_day(date) {
                continue;
            }

            // A rule may be wider than the clinic window; intersect, don't
            // trust the rule.
            let Some(open) = calendar::intersect(&window, &config.window_for(date)) else {
                continue;
            };

            let grid_origin = date.and_time(config.start_time).and_utc();
            for after_holidays in calendar::subtract(&open, &holiday_blocks) {
                for free in calendar::subtract(&after_holidays, &booked) {
                    aligned_slots(
                        &free,
                        grid_origin,
                        config.block_interval_minutes,
                        slot_minutes,
                        &mut slots,
                    );
                }
            }
        }

        slots.sort_by_key(|slot| slot.start);
        slots.dedup();

        debug!(
            "generated {} slots for professional {} in unit {}",
            slots.len(),
            professional_id,
            unit_id
        );
        Ok(slots)
    }
}

/// Emit consecutive slots of `slot_minutes` inside `free`, every start
/// rounded up to a multiple of `block_minutes` from `grid_origin`. Slots that
/// would overflow the free interval are dropped.
fn aligned_slots(
    free: &Interval,
    grid_origin: DateTime<Utc>,
    block_minutes: i64,
    slot_minutes: i64,
    out: &mut Vec<Slot>,
) {
    let slot_len = Duration::minutes(slot_minutes);
    let mut start = align_up(free.start(), grid_origin, block_minutes);
    while start + slot_len <= free.end() {
        out.push(Slot {
            start,
            end: start + slot_len,
        });
        start = align_up(start + slot_len, grid_origin, block_minutes);
    }
}

fn align_up(at: DateTime<Utc>, grid_origin: DateTime<Utc>, block_minutes: i64) -> DateTime<Utc> {
    let offset = (at - grid_origin).num_minutes();
    let remainder = offset.rem_euclid(block_minutes);
    if remainder == 0 {
        at
    } else {
        at + Duration::minutes(block_minutes - remainder)
    }
}
