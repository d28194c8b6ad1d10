// libs/scheduling-cell/src/services/availability.rs
//
// Expands a professional's recurring weekly rules into concrete open
// intervals for a date range. Purely derived from the rule rows; recomputed
// on every call, never cached.

use tracing::debug;

use crate::models::{DateRange, Interval, ScheduleConfig, ScheduleRule, SchedulingError};
use crate::services::calendar;

/// Nominal availability before holidays and bookings are subtracted: for each
/// date in range, every rule matching that weekday contributes its window
/// minus its own exceptions.
pub fn windows_for(
    rules: &[ScheduleRule],
    range: DateRange,
) -> impl Iterator<Item = Interval> + '_ {
    range.days().flat_map(move |date| {
        rules
            .iter()
            .filter(move |rule| rule.applies_on(date))
            .flat_map(move |rule| {
                let window = Interval::from_parts(
                    date.and_time(rule.start_time).and_utc(),
                    date.and_time(rule.end_time).and_utc(),
                );
                let blocked: Vec<Interval> = rule
                    .exceptions
                    .iter()
                    .map(|exception| {
                        Interval::from_parts(
                            date.and_time(exception.start_time).and_utc(),
                            date.and_time(exception.end_time).and_utc(),
                        )
                    })
                    .collect();
                calendar::subtract(&window, &blocked)
            })
    })
}

/// Write-time validation for a new rule. Overlapping windows for the same
/// professional/day are a configuration error, rejected here and never merged
/// at evaluation time.
pub fn validate_rule(
    candidate: &ScheduleRule,
    existing: &[ScheduleRule],
    config: &ScheduleConfig,
) -> Result<(), SchedulingError> {
    if candidate.start_time >= candidate.end_time {
        return Err(SchedulingError::InvalidInterval(format!(
            "rule start {} must be before end {}",
            candidate.start_time, candidate.end_time
        )));
    }

    if candidate.start_time < config.start_time || candidate.end_time > config.end_time {
        return Err(SchedulingError::InvalidInterval(format!(
            "rule window {}-{} lies outside the unit window {}-{}",
            candidate.start_time, candidate.end_time, config.start_time, config.end_time
        )));
    }

    for exception in &candidate.exceptions {
        if exception.start_time >= exception.end_time {
            return Err(SchedulingError::InvalidInterval(format!(
                "exception start {} must be before end {}",
                exception.start_time, exception.end_time
            )));
        }
        if exception.start_time < candidate.start_time
            || exception.end_time > candidate.end_time
        {
            return Err(SchedulingError::InvalidInterval(format!(
                "exception {}-{} lies outside the rule window",
                exception.start_time, exception.end_time
            )));
        }
    }

    for rule in existing {
        if rule.professional_id != candidate.professional_id
            || rule.unit_id != candidate.unit_id
            || !rule.shares_day_with(candidate)
        {
            continue;
        }
        if candidate.start_time < rule.end_time && rule.start_time < candidate.end_time {
            debug!(
                "rule {}-{} rejected: overlaps existing rule {}",
                candidate.start_time, candidate.end_time, rule.id
            );
            return Err(SchedulingError::RuleOverlap(format!(
                "window {}-{} overlaps rule {} ({}-{}) on a shared weekday",
                candidate.start_time,
                candidate.end_time,
                rule.id,
                rule.start_time,
                rule.end_time
            )));
        }
    }

    Ok(())
}
