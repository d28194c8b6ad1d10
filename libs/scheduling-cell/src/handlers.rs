// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::AppError;

use crate::models::{
    BookSlotRequest, CreateHolidayRequest, CreateRuleRequest, CreateScheduleTypeRequest,
    DateRange, SchedulingError, UpdateEventStatusRequest, UpsertConfigRequest,
};
use crate::services::booking::BookingCoordinator;
use crate::services::ledger::BookingLedger;
use crate::services::slots::SlotGeneratorService;
use crate::store::SchedulingStore;

/// Shared state for the scheduling routes: the reference-data store, the
/// event ledger, and the services composed over them.
pub struct SchedulingState {
    pub store: Arc<SchedulingStore>,
    pub ledger: Arc<BookingLedger>,
    pub slot_generator: SlotGeneratorService,
    pub coordinator: BookingCoordinator,
}

impl SchedulingState {
    pub fn new(config: &AppConfig) -> Self {
        let store = Arc::new(SchedulingStore::new());
        let ledger = Arc::new(BookingLedger::new(config.commit_lock_timeout_ms));
        let slot_generator = SlotGeneratorService::new(Arc::clone(&store), Arc::clone(&ledger));
        let coordinator = BookingCoordinator::new(Arc::clone(&store), Arc::clone(&ledger));
        Self {
            store,
            ledger,
            slot_generator,
            coordinator,
        }
    }
}

impl From<SchedulingError> for AppError {
    fn from(error: SchedulingError) -> Self {
        match &error {
            SchedulingError::ConfigMissing(_)
            | SchedulingError::UnknownScheduleType(_)
            | SchedulingError::UnknownProtocolService(_)
            | SchedulingError::EventNotFound(_) => AppError::NotFound(error.to_string()),
            SchedulingError::SlotConflict
            | SchedulingError::IntervalTooSoon { .. }
            | SchedulingError::StaleSlot
            | SchedulingError::Timeout
            | SchedulingError::InvalidStatusTransition { .. } => {
                AppError::Conflict(error.to_string())
            }
            SchedulingError::InvalidInterval(_) | SchedulingError::RuleOverlap(_) => {
                AppError::Unprocessable(error.to_string())
            }
        }
    }
}

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct SlotQueryParams {
    pub professional_id: Uuid,
    pub unit_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub schedule_type_id: Uuid,
    pub protocol_service_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct EventQueryParams {
    pub professional_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

// ==============================================================================
// SLOT AND EVENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn generate_slots(
    State(state): State<Arc<SchedulingState>>,
    Query(params): Query<SlotQueryParams>,
) -> Result<Json<Value>, AppError> {
    let range = DateRange::new(params.from, params.to)?;
    let schedule_type = state
        .store
        .schedule_type(params.schedule_type_id)
        .ok_or(SchedulingError::UnknownScheduleType(params.schedule_type_id))?;
    let duration_minutes = schedule_type.duration_for(params.protocol_service_id)?;

    let slots = state.slot_generator.generate_slots(
        params.professional_id,
        params.unit_id,
        range,
        duration_minutes,
    )?;

    Ok(Json(json!({
        "professional_id": params.professional_id,
        "unit_id": params.unit_id,
        "duration_minutes": duration_minutes,
        "slots": slots,
    })))
}

#[axum::debug_handler]
pub async fn book_event(
    State(state): State<Arc<SchedulingState>>,
    Json(request): Json<BookSlotRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let event = state.coordinator.book_slot(request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "event": event }))))
}

#[axum::debug_handler]
pub async fn list_events(
    State(state): State<Arc<SchedulingState>>,
    Query(params): Query<EventQueryParams>,
) -> Result<Json<Value>, AppError> {
    let range = DateRange::new(params.from, params.to)?;
    let events = state.ledger.events_for(params.professional_id, &range);
    Ok(Json(json!({ "events": events })))
}

#[axum::debug_handler]
pub async fn cancel_event(
    State(state): State<Arc<SchedulingState>>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let event = state.coordinator.cancel(event_id)?;
    Ok(Json(json!({ "event": event })))
}

#[axum::debug_handler]
pub async fn update_event_status(
    State(state): State<Arc<SchedulingState>>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<UpdateEventStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let event = state.coordinator.update_status(event_id, request)?;
    Ok(Json(json!({ "event": event })))
}

// ==============================================================================
// ADMIN CONFIGURATION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn upsert_config(
    State(state): State<Arc<SchedulingState>>,
    Path(unit_id): Path<Uuid>,
    Json(request): Json<UpsertConfigRequest>,
) -> Result<Json<Value>, AppError> {
    let config = state.store.upsert_config(unit_id, request)?;
    Ok(Json(json!({ "config": config })))
}

#[axum::debug_handler]
pub async fn get_config(
    State(state): State<Arc<SchedulingState>>,
    Path(unit_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let config = state
        .store
        .config_for_unit(unit_id)
        .ok_or(SchedulingError::ConfigMissing(unit_id))?;
    Ok(Json(json!({ "config": config })))
}

#[axum::debug_handler]
pub async fn create_rule(
    State(state): State<Arc<SchedulingState>>,
    Json(request): Json<CreateRuleRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let rule = state.store.create_rule(request)?;
    Ok((StatusCode::CREATED, Json(json!({ "rule": rule }))))
}

#[axum::debug_handler]
pub async fn list_rules(
    State(state): State<Arc<SchedulingState>>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(json!({ "rules": state.store.list_rules() })))
}

#[axum::debug_handler]
pub async fn delete_rule(
    State(state): State<Arc<SchedulingState>>,
    Path(rule_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.store.delete_rule(rule_id) {
        return Err(AppError::NotFound(format!("Rule {} not found", rule_id)));
    }
    Ok(Json(json!({ "deleted": rule_id })))
}

#[axum::debug_handler]
pub async fn create_holiday(
    State(state): State<Arc<SchedulingState>>,
    Json(request): Json<CreateHolidayRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let holiday = state.store.create_holiday(request)?;
    Ok((StatusCode::CREATED, Json(json!({ "holiday": holiday }))))
}

#[axum::debug_handler]
pub async fn list_holidays(
    State(state): State<Arc<SchedulingState>>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(json!({ "holidays": state.store.holidays() })))
}

#[axum::debug_handler]
pub async fn delete_holiday(
    State(state): State<Arc<SchedulingState>>,
    Path(holiday_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if !state.store.delete_holiday(holiday_id) {
        return Err(AppError::NotFound(format!(
            "Holiday {} not found",
            holiday_id
        )));
    }
    Ok(Json(json!({ "deleted": holiday_id })))
}

#[axum::debug_handler]
pub async fn create_schedule_type(
    State(state): State<Arc<SchedulingState>>,
    Json(request): Json<CreateScheduleTypeRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let schedule_type = state.store.create_schedule_type(request)?;
    Ok((StatusCode::CREATED, Json(json!({ "type": schedule_type }))))
}

#[axum::debug_handler]
pub async fn get_schedule_type(
    State(state): State<Arc<SchedulingState>>,
    Path(type_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let schedule_type = state
        .store
        .schedule_type(type_id)
        .ok_or(SchedulingError::UnknownScheduleType(type_id))?;
    Ok(Json(json!({ "type": schedule_type })))
}
