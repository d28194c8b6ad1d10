// libs/scheduling-cell/src/services/ledger.rs
//
// Authoritative in-process store of committed schedule events. Conflict
// checks and commits for the same professional serialize on a per-professional
// mutex; different professionals proceed in parallel. Reads never lock the
// commit path.

use chrono::{NaiveDate, NaiveTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{DateRange, EventStatus, Interval, ScheduleEvent, SchedulingError};
use crate::services::calendar;

pub struct BookingLedger {
    events: RwLock<HashMap<Uuid, Vec<ScheduleEvent>>>,
    commit_locks: StdMutex<HashMap<Uuid, Arc<Mutex<()>>>>,
    commit_timeout: Duration,
}

impl BookingLedger {
    pub fn new(commit_timeout_ms: u64) -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
            commit_locks: StdMutex::new(HashMap::new()),
            commit_timeout: Duration::from_millis(commit_timeout_ms),
        }
    }

    /// All non-cancelled events for the professional overlapping the
    /// candidate interval, in chronological order.
    pub fn conflicts_with(&self, candidate: &Interval, professional_id: Uuid) -> Vec<ScheduleEvent> {
        let events = self
            .events
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut conflicts: Vec<ScheduleEvent> = events
            .get(&professional_id)
            .map(|rows| {
                rows.iter()
                    .filter(|event| {
                        event.blocks_time() && calendar::overlaps(candidate, &event.interval())
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        conflicts.sort_by_key(|event| event.start_time);
        conflicts
    }

    /// Commit the event unless a non-cancelled event already overlaps it.
    /// The conflict check and the insert run under the professional's commit
    /// lock, so of two racing commits for overlapping intervals exactly one
    /// succeeds. Waiting for the lock is bounded; an exceeded bound surfaces
    /// as `Timeout`, never as a hang.
    pub async fn commit(&self, event: ScheduleEvent) -> Result<ScheduleEvent, SchedulingError> {
        let lock = self.professional_lock(event.professional_id);
        let _guard = timeout(self.commit_timeout, lock.lock())
            .await
            .map_err(|_| {
                warn!(
                    "commit for professional {} timed out after {:?}",
                    event.professional_id, self.commit_timeout
                );
                SchedulingError::Timeout
            })?;

        let conflicts = self.conflicts_with(&event.interval(), event.professional_id);
        if !conflicts.is_empty() {
            warn!(
                "commit rejected for professional {}: {} conflicting events at {}",
                event.professional_id,
                conflicts.len(),
                event.start_time
            );
            return Err(SchedulingError::SlotConflict);
        }

        let mut events = self
            .events
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        events
            .entry(event.professional_id)
            .or_default()
            .push(event.clone());

        info!(
            "event {} committed for professional {} at {}",
            event.id, event.professional_id, event.start_time
        );
        Ok(event)
    }

    pub fn event(&self, event_id: Uuid) -> Option<ScheduleEvent> {
        let events = self
            .events
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        events
            .values()
            .flatten()
            .find(|event| event.id == event_id)
            .cloned()
    }

    /// Professional timeline for a date range, cancelled events included.
    pub fn events_for(&self, professional_id: Uuid, range: &DateRange) -> Vec<ScheduleEvent> {
        let window = Interval::from_parts(
            range.from_date().and_time(NaiveTime::MIN).and_utc(),
            (range.to_date() + chrono::Duration::days(1))
                .and_time(NaiveTime::MIN)
                .and_utc(),
        );
        let events = self
            .events
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut rows: Vec<ScheduleEvent> = events
            .get(&professional_id)
            .map(|rows| {
                rows.iter()
                    .filter(|event| calendar::overlaps(&window, &event.interval()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by_key(|event| event.start_time);
        rows
    }

    /// Intervals occupied by non-cancelled events, for slot subtraction.
    pub fn blocked_intervals_for(&self, professional_id: Uuid, range: &DateRange) -> Vec<Interval> {
        self.events_for(professional_id, range)
            .into_iter()
            .filter(|event| event.blocks_time())
            .map(|event| event.interval())
            .collect()
    }

    /// Idempotent cancellation: `scheduled|confirmed -> cancelled`, repeating
    /// it on an already-cancelled event is a no-op. Completed events stay.
    pub fn cancel(&self, event_id: Uuid) -> Result<ScheduleEvent, SchedulingError> {
        self.transition(event_id, EventStatus::Cancelled)
    }

    pub fn update_status(
        &self,
        event_id: Uuid,
        status: EventStatus,
    ) -> Result<ScheduleEvent, SchedulingError> {
        self.transition(event_id, status)
    }

    /// Most recent session date of this patient/service pair strictly before
    /// `before`, across non-cancelled events. Input to interval control.
    pub fn last_session_before(
        &self,
        patient_id: Uuid,
        protocol_service_id: Uuid,
        before: NaiveDate,
    ) -> Option<NaiveDate> {
        let events = self
            .events
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        events
            .values()
            .flatten()
            .filter(|event| {
                event.blocks_time()
                    && event.patient_id == patient_id
                    && event.protocol_service_id == Some(protocol_service_id)
                    && event.start_time.date_naive() < before
            })
            .map(|event| event.start_time.date_naive())
            .max()
    }

    fn transition(
        &self,
        event_id: Uuid,
        next: EventStatus,
    ) -> Result<ScheduleEvent, SchedulingError> {
        let mut events = self
            .events
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let event = events
            .values_mut()
            .flatten()
            .find(|event| event.id == event_id)
            .ok_or(SchedulingError::EventNotFound(event_id))?;

        if event.status == next {
            // Idempotent repeat of the same transition.
            return Ok(event.clone());
        }

        let allowed = matches!(
            (event.status, next),
            (EventStatus::Scheduled, EventStatus::Confirmed)
                | (EventStatus::Scheduled, EventStatus::Completed)
                | (EventStatus::Scheduled, EventStatus::Cancelled)
                | (EventStatus::Confirmed, EventStatus::Completed)
                | (EventStatus::Confirmed, EventStatus::Cancelled)
        );
        if !allowed {
            return Err(SchedulingError::InvalidStatusTransition {
                from: event.status,
                to: next,
            });
        }

        debug!("event {} transition {} -> {}", event_id, event.status, next);
        event.status = next;
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    fn professional_lock(&self, professional_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self
            .commit_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(locks.entry(professional_id).or_default())
    }
}
