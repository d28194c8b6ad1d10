// libs/scheduling-cell/src/services/interval_control.rs

use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::models::{ProtocolService, SchedulingError};
use crate::services::ledger::BookingLedger;

/// Enforces the minimum gap between a patient's consecutive sessions of the
/// same protocol service. Violations are rejected before ledger commit, never
/// silently shortened.
pub struct IntervalControlService {
    ledger: Arc<BookingLedger>,
}

impl IntervalControlService {
    pub fn new(ledger: Arc<BookingLedger>) -> Self {
        Self { ledger }
    }

    pub fn check_interval(
        &self,
        patient_id: Uuid,
        service: &ProtocolService,
        proposed_date: NaiveDate,
    ) -> Result<(), SchedulingError> {
        if !service.requires_interval_control {
            return Ok(());
        }
        // min_interval_days is validated present at type-creation time.
        let Some(gap_days) = service.min_interval_days else {
            return Ok(());
        };

        let Some(last) = self
            .ledger
            .last_session_before(patient_id, service.id, proposed_date)
        else {
            return Ok(());
        };

        let earliest = last + Duration::days(gap_days);
        if proposed_date < earliest {
            debug!(
                "interval control rejected patient {} for service {}: last session {}, earliest {}",
                patient_id, service.id, last, earliest
            );
            return Err(SchedulingError::IntervalTooSoon { earliest });
        }
        Ok(())
    }
}
