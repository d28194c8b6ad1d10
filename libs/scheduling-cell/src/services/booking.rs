// libs/scheduling-cell/src/services/booking.rs
//
// Admits or rejects booking requests. A request moves
// Requested -> Validated -> Committed, or stops at Rejected with a typed
// error; retries are a caller decision, never automatic.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    BookSlotRequest, DateRange, EventStatus, Interval, ScheduleEvent, SchedulingError,
    UpdateEventStatusRequest,
};
use crate::services::interval_control::IntervalControlService;
use crate::services::ledger::BookingLedger;
use crate::services::slots::SlotGeneratorService;
use crate::store::SchedulingStore;

pub struct BookingCoordinator {
    store: Arc<SchedulingStore>,
    ledger: Arc<BookingLedger>,
    slot_generator: SlotGeneratorService,
    interval_control: IntervalControlService,
}

impl BookingCoordinator {
    pub fn new(store: Arc<SchedulingStore>, ledger: Arc<BookingLedger>) -> Self {
        let slot_generator = SlotGeneratorService::new(Arc::clone(&store), Arc::clone(&ledger));
        let interval_control = IntervalControlService::new(Arc::clone(&ledger));
        Self {
            store,
            ledger,
            slot_generator,
            interval_control,
        }
    }

    pub async fn book_slot(
        &self,
        request: BookSlotRequest,
    ) -> Result<ScheduleEvent, SchedulingError> {
        debug!(
            "booking requested: professional {} patient {} at {}",
            request.professional_id, request.patient_id, request.start_time
        );

        let candidate = Interval::new(request.start_time, request.end_time)?;

        let schedule_type = self
            .store
            .schedule_type(request.schedule_type_id)
            .ok_or(SchedulingError::UnknownScheduleType(request.schedule_type_id))?;
        let duration_minutes = schedule_type.duration_for(request.protocol_service_id)?;

        // Re-derive the slot list for the candidate date. This defends
        // against stale client-side slot lists: the candidate must still be
        // a grid-aligned, in-window, unblocked slot right now.
        let date = candidate.start().date_naive();
        let slots = self.slot_generator.generate_slots(
            request.professional_id,
            request.unit_id,
            DateRange::single_day(date),
            duration_minutes,
        )?;
        let still_listed = slots
            .iter()
            .any(|slot| slot.start == candidate.start() && slot.end == candidate.end());
        if !still_listed {
            warn!(
                "stale candidate rejected: professional {} at {}",
                request.professional_id, request.start_time
            );
            return Err(SchedulingError::StaleSlot);
        }

        if let Some(service_id) = request.protocol_service_id {
            let service = schedule_type
                .protocol_service(service_id)
                .ok_or(SchedulingError::UnknownProtocolService(service_id))?;
            self.interval_control
                .check_interval(request.patient_id, service, date)?;
        }

        // Validated; the ledger's commit closes the race authoritatively.
        let now = Utc::now();
        let event = ScheduleEvent {
            id: Uuid::new_v4(),
            professional_id: request.professional_id,
            unit_id: request.unit_id,
            patient_id: request.patient_id,
            start_time: candidate.start(),
            end_time: candidate.end(),
            schedule_type_id: request.schedule_type_id,
            protocol_service_id: request.protocol_service_id,
            status: EventStatus::Scheduled,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };

        let committed = self.ledger.commit(event).await?;
        info!(
            "booking committed: event {} for professional {}",
            committed.id, committed.professional_id
        );
        Ok(committed)
    }

    pub fn cancel(&self, event_id: Uuid) -> Result<ScheduleEvent, SchedulingError> {
        self.ledger.cancel(event_id)
    }

    pub fn update_status(
        &self,
        event_id: Uuid,
        request: UpdateEventStatusRequest,
    ) -> Result<ScheduleEvent, SchedulingError> {
        self.ledger.update_status(event_id, request.status)
    }
}
