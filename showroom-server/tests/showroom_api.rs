//! End-to-end flows through the HTTP router against the in-memory store

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use showroom_server::db::MemoryStore;
use showroom_server::hub::Frame;
use showroom_server::{AppState, LiveConfig, api};
use tokio::sync::mpsc;
use tower::ServiceExt;

fn app() -> (Router, AppState) {
    let state = AppState::with_store(Arc::new(MemoryStore::new()), LiveConfig::default());
    (api::create_router(state.clone()), state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    dealership: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(d) = dealership {
        builder = builder.header("x-dealership-id", d).header("x-staff-id", "11");
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn dashboard(state: &AppState, dealership: &str) -> mpsc::Receiver<Frame> {
    let (id, mut rx) = state.hub.register();
    assert!(state.hub.subscribe(id, dealership));
    let ack: Value = serde_json::from_str(rx.try_recv().unwrap().as_str()).unwrap();
    assert_eq!(ack["type"], "SUBSCRIBED");
    rx
}

fn pushed_types(rx: &mut mpsc::Receiver<Frame>) -> Vec<String> {
    let mut types = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        let msg: Value = serde_json::from_str(frame.as_str()).unwrap();
        types.push(msg["type"].as_str().unwrap().to_string());
    }
    types
}

#[tokio::test]
async fn health_reports_connections() {
    let (app, state) = app();
    let _dash = dashboard(&state, "north");

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["connections"], 1);
}

#[tokio::test]
async fn visit_lifecycle_is_pushed_to_the_dealership() {
    let (app, state) = app();
    let mut north = dashboard(&state, "north");
    let mut south = dashboard(&state, "south");

    let (status, visit) = send(
        &app,
        "POST",
        "/api/visits",
        Some("north"),
        Some(json!({ "customer_id": 501, "source": "WALK_IN", "initial_note": "Looking at SUVs" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(visit["status"], "CHECKED_IN");
    assert_eq!(visit["active_timer"]["timer_type"], "WAIT_TIME");
    let id = visit["id"].as_i64().unwrap();

    let (status, detail) = send(
        &app,
        "POST",
        &format!("/api/visits/{id}/status"),
        Some("north"),
        Some(json!({ "status": "TEST_DRIVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["workflow_stage"], 2);

    let (status, timer) = send(
        &app,
        "POST",
        &format!("/api/visits/{id}/timers"),
        Some("north"),
        Some(json!({ "timer_type": "TEST_DRIVE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let timer_id = timer["id"].as_i64().unwrap();

    let (status, stopped) = send(
        &app,
        "POST",
        &format!("/api/visits/{id}/timers/{timer_id}/stop"),
        Some("north"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(stopped["duration_seconds"].is_i64());

    let (status, closed) = send(
        &app,
        "POST",
        &format!("/api/visits/{id}/close"),
        Some("north"),
        Some(json!({ "status": "CLOSED_WON" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(closed["check_out_time"].is_i64());
    assert!(closed["active_timer"].is_null());

    let (_, timers) = send(
        &app,
        "GET",
        &format!("/api/visits/{id}/timers"),
        Some("north"),
        None,
    )
    .await;
    assert!(
        timers
            .as_array()
            .unwrap()
            .iter()
            .all(|t| !t["end_time"].is_null())
    );

    let (_, events) = send(
        &app,
        "GET",
        &format!("/api/visits/{id}/events"),
        Some("north"),
        None,
    )
    .await;
    let kinds: Vec<&str> = events
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "VISIT_CLOSED",
            "TIMER_STOPPED",
            "TIMER_STARTED",
            "STATUS_CHANGED",
            "VISIT_CREATED"
        ]
    );

    let (_, notes) = send(
        &app,
        "GET",
        &format!("/api/visits/{id}/notes"),
        Some("north"),
        None,
    )
    .await;
    assert_eq!(notes[0]["content"], "Looking at SUVs");

    assert_eq!(
        pushed_types(&mut north),
        vec![
            "VISIT_CREATED",
            "STATUS_CHANGED",
            "TIMER_STARTED",
            "TIMER_STOPPED",
            "VISIT_CLOSED"
        ]
    );
    assert!(pushed_types(&mut south).is_empty());
}

#[tokio::test]
async fn other_dealership_cannot_reach_a_visit() {
    let (app, state) = app();
    let (_, visit) = send(
        &app,
        "POST",
        "/api/visits",
        Some("south"),
        Some(json!({ "customer_id": 1 })),
    )
    .await;
    let id = visit["id"].as_i64().unwrap();
    let mut south = dashboard(&state, "south");

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/visits/{id}/status"),
        Some("north"),
        Some(json!({ "status": "BROWSING" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);

    let (status, _) = send(&app, "GET", &format!("/api/visits/{id}"), Some("north"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, page) = send(&app, "GET", "/api/visits", Some("north"), None).await;
    assert_eq!(page["total"], 0);

    assert!(pushed_types(&mut south).is_empty());
}

#[tokio::test]
async fn requests_without_dealership_are_rejected() {
    let (app, _) = app();
    let (status, body) = send(&app, "GET", "/api/visits", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 3001);
}

#[tokio::test]
async fn invalid_input_is_rejected_before_persistence() {
    let (app, state) = app();
    let mut north = dashboard(&state, "north");

    let (status, body) = send(
        &app,
        "POST",
        "/api/visits",
        Some("north"),
        Some(json!({ "customer_id": 1, "source": "BILLBOARD" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);

    let (_, visit) = send(
        &app,
        "POST",
        "/api/visits",
        Some("north"),
        Some(json!({ "customer_id": 1 })),
    )
    .await;
    let id = visit["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/visits/{id}/status"),
        Some("north"),
        Some(json!({ "status": "ON_HOLD" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/visits/{id}/close"),
        Some("north"),
        Some(json!({ "status": "PAPERWORK" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4004);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/visits/{id}/notes"),
        Some("north"),
        Some(json!({ "content": "x".repeat(2001) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, events) = send(
        &app,
        "GET",
        &format!("/api/visits/{id}/events"),
        Some("north"),
        None,
    )
    .await;
    assert_eq!(events.as_array().unwrap().len(), 1);
    assert_eq!(pushed_types(&mut north), vec!["VISIT_CREATED"]);
}

#[tokio::test]
async fn workflow_config_drives_stage_numbers() {
    let (app, _) = app();

    let (status, config) = send(&app, "GET", "/api/workflow-config", Some("north"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(config["stages"].as_array().unwrap().len(), 5);

    let (status, _) = send(
        &app,
        "PUT",
        "/api/workflow-config",
        Some("north"),
        Some(json!({
            "stages": [
                { "status": "CHECKED_IN", "label": "Greeted" },
                { "status": "NEGOTIATING", "label": "At the desk" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "PUT",
        "/api/workflow-config",
        Some("north"),
        Some(json!({ "stages": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 7001);

    let (_, visit) = send(
        &app,
        "POST",
        "/api/visits",
        Some("north"),
        Some(json!({ "customer_id": 3 })),
    )
    .await;
    let id = visit["id"].as_i64().unwrap();
    let (_, detail) = send(
        &app,
        "POST",
        &format!("/api/visits/{id}/status"),
        Some("north"),
        Some(json!({ "status": "NEGOTIATING" })),
    )
    .await;
    assert_eq!(detail["workflow_stage"], 1);

    // other dealerships keep the built-in order
    let (_, other) = send(&app, "GET", "/api/workflow-config", Some("south"), None).await;
    assert_eq!(other["stages"][1]["status"], "BROWSING");
}
