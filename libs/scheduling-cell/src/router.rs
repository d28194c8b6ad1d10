// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::handlers::{self, SchedulingState};

pub fn scheduling_routes(state: Arc<SchedulingState>) -> Router {
    Router::new()
        // Slot generation and booking
        .route("/slots", get(handlers::generate_slots))
        .route("/events", post(handlers::book_event).get(handlers::list_events))
        .route("/events/{event_id}/cancel", post(handlers::cancel_event))
        .route("/events/{event_id}/status", patch(handlers::update_event_status))
        // Admin configuration
        .route(
            "/config/{unit_id}",
            put(handlers::upsert_config).get(handlers::get_config),
        )
        .route("/rules", post(handlers::create_rule).get(handlers::list_rules))
        .route("/rules/{rule_id}", delete(handlers::delete_rule))
        .route(
            "/holidays",
            post(handlers::create_holiday).get(handlers::list_holidays),
        )
        .route("/holidays/{holiday_id}", delete(handlers::delete_holiday))
        .route("/types", post(handlers::create_schedule_type))
        .route("/types/{type_id}", get(handlers::get_schedule_type))
        .with_state(state)
}
