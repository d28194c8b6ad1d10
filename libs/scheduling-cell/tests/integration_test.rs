use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use scheduling_cell::handlers::SchedulingState;
use scheduling_cell::router::scheduling_routes;
use shared_config::AppConfig;

fn app() -> Router {
    let state = Arc::new(SchedulingState::new(&AppConfig::default()));
    scheduling_routes(state)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn config_body() -> Value {
    json!({
        "default_view": "week",
        "block_interval_minutes": 30,
        "working_days": ["monday"],
        "start_time": "08:00:00",
        "end_time": "12:00:00",
        "default_type_name": "Consultation"
    })
}

async fn put_config(app: &Router, unit_id: Uuid) {
    let (status, _) = send(
        app,
        json_request("PUT", &format!("/config/{}", unit_id), config_body()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn create_consultation_type(app: &Router) -> Uuid {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/types",
            json!({
                "name": "Consultation",
                "duration_minutes": 30,
                "schedule_type": "single"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["type"]["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn config_round_trips_and_missing_config_is_404() {
    let app = app();
    let unit_id = Uuid::new_v4();

    let (status, _) = send(&app, get_request(&format!("/config/{}", unit_id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    put_config(&app, unit_id).await;

    let (status, body) = send(&app, get_request(&format!("/config/{}", unit_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["block_interval_minutes"], 30);
    assert_eq!(body["config"]["unit_id"], json!(unit_id.to_string()));
}

#[tokio::test]
async fn malformed_config_is_unprocessable() {
    let app = app();
    let mut body = config_body();
    body["start_time"] = json!("18:00:00");

    let (status, _) = send(
        &app,
        json_request("PUT", &format!("/config/{}", Uuid::new_v4()), body),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn overlapping_rule_is_unprocessable() {
    let app = app();
    let unit_id = Uuid::new_v4();
    let professional_id = Uuid::new_v4();
    put_config(&app, unit_id).await;

    let rule = json!({
        "professional_id": professional_id,
        "unit_id": unit_id,
        "days_of_week": ["monday"],
        "start_time": "09:00:00",
        "end_time": "11:00:00"
    });
    let (status, _) = send(&app, json_request("POST", "/rules", rule.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, json_request("POST", "/rules", rule)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("overlap"));
}

#[tokio::test]
async fn slot_listing_and_booking_flow() {
    let app = app();
    let unit_id = Uuid::new_v4();
    let professional_id = Uuid::new_v4();
    put_config(&app, unit_id).await;
    let type_id = create_consultation_type(&app).await;

    // 2024-06-03 is a Monday; the whole 08:00-12:00 window is open.
    let slots_uri = format!(
        "/slots?professional_id={}&unit_id={}&from=2024-06-03&to=2024-06-03&schedule_type_id={}",
        professional_id, unit_id, type_id
    );
    let (status, body) = send(&app, get_request(&slots_uri)).await;
    assert_eq!(status, StatusCode::OK);
    let slots = body["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 8);
    assert_eq!(slots[0]["start"], json!("2024-06-03T08:00:00Z"));

    let booking = json!({
        "professional_id": professional_id,
        "unit_id": unit_id,
        "patient_id": Uuid::new_v4(),
        "start_time": "2024-06-03T09:00:00Z",
        "end_time": "2024-06-03T09:30:00Z",
        "schedule_type_id": type_id
    });
    let (status, body) = send(&app, json_request("POST", "/events", booking.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["event"]["status"], json!("scheduled"));
    let event_id = body["event"]["id"].as_str().unwrap().to_string();

    // The booked slot no longer shows up.
    let (_, body) = send(&app, get_request(&slots_uri)).await;
    assert_eq!(body["slots"].as_array().unwrap().len(), 7);

    // Rebooking the same slot conflicts.
    let (status, _) = send(&app, json_request("POST", "/events", booking)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The event is visible on the professional's timeline.
    let events_uri = format!(
        "/events?professional_id={}&from=2024-06-03&to=2024-06-03",
        professional_id
    );
    let (status, body) = send(&app, get_request(&events_uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"].as_array().unwrap().len(), 1);

    // Cancelling frees the slot again.
    let (status, body) = send(
        &app,
        json_request("POST", &format!("/events/{}/cancel", event_id), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["status"], json!("cancelled"));

    let (_, body) = send(&app, get_request(&slots_uri)).await;
    assert_eq!(body["slots"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn booking_with_unknown_type_is_404() {
    let app = app();
    let unit_id = Uuid::new_v4();
    put_config(&app, unit_id).await;

    let booking = json!({
        "professional_id": Uuid::new_v4(),
        "unit_id": unit_id,
        "patient_id": Uuid::new_v4(),
        "start_time": "2024-06-03T09:00:00Z",
        "end_time": "2024-06-03T09:30:00Z",
        "schedule_type_id": Uuid::new_v4()
    });
    let (status, _) = send(&app, json_request("POST", "/events", booking)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn off_grid_booking_is_a_conflict() {
    let app = app();
    let unit_id = Uuid::new_v4();
    put_config(&app, unit_id).await;
    let type_id = create_consultation_type(&app).await;

    let booking = json!({
        "professional_id": Uuid::new_v4(),
        "unit_id": unit_id,
        "patient_id": Uuid::new_v4(),
        "start_time": "2024-06-03T09:15:00Z",
        "end_time": "2024-06-03T09:45:00Z",
        "schedule_type_id": type_id
    });
    let (status, _) = send(&app, json_request("POST", "/events", booking)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn status_updates_flow_through_the_api() {
    let app = app();
    let unit_id = Uuid::new_v4();
    let professional_id = Uuid::new_v4();
    put_config(&app, unit_id).await;
    let type_id = create_consultation_type(&app).await;

    let booking = json!({
        "professional_id": professional_id,
        "unit_id": unit_id,
        "patient_id": Uuid::new_v4(),
        "start_time": "2024-06-03T10:00:00Z",
        "end_time": "2024-06-03T10:30:00Z",
        "schedule_type_id": type_id
    });
    let (_, body) = send(&app, json_request("POST", "/events", booking)).await;
    let event_id = body["event"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/events/{}/status", event_id),
            json!({ "status": "completed" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["status"], json!("completed"));

    // Completed events cannot be cancelled.
    let (status, _) = send(
        &app,
        json_request("POST", &format!("/events/{}/cancel", event_id), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn holiday_administration_round_trips() {
    let app = app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/holidays",
            json!({ "name": "New year", "type": "recurring", "day": 1, "month": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let holiday_id = body["holiday"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get_request("/holidays")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["holidays"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/holidays/{}", holiday_id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/holidays/{}", holiday_id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
