mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use lotto_common::ValueSet;

#[tokio::test]
async fn health_returns_ok() {
    let state = common::test_state();
    let server = TestServer::new(common::test_app(&state)).unwrap();

    let resp = server.get("/health").await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["status"], "ok");
}

// ---------------------------------------------------------------------------
// GET /api/v1/draw
// ---------------------------------------------------------------------------

#[tokio::test]
async fn draw_returns_value_set_without_broadcasting() {
    let state = common::test_state();
    let server = TestServer::new(common::test_app(&state)).unwrap();

    let resp = server.get("/api/v1/draw").await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    let values: ValueSet = serde_json::from_value(body["values"].clone()).expect("value set");
    assert_eq!(values.values().len(), 6);
    assert_eq!(state.hub.stats().queued, 0);
}

// ---------------------------------------------------------------------------
// POST /api/v1/hub/broadcast
// ---------------------------------------------------------------------------

#[tokio::test]
async fn broadcast_queues_value_set() {
    let state = common::test_state();
    let server = TestServer::new(common::test_app(&state)).unwrap();

    let resp = server.post("/api/v1/hub/broadcast").await;
    resp.assert_status(StatusCode::ACCEPTED);
    let body: serde_json::Value = resp.json();
    assert!(serde_json::from_value::<ValueSet>(body["values"].clone()).is_ok());
    assert_eq!(body["dropped_oldest"], false);
    assert_eq!(state.hub.stats().queued, 1);
}

#[tokio::test]
async fn broadcast_reports_dropped_oldest_when_full() {
    let state = common::test_state();
    let server = TestServer::new(common::test_app(&state)).unwrap();
    let capacity = state.config.queue_capacity;

    for _ in 0..capacity {
        server.post("/api/v1/hub/broadcast").await.assert_status(StatusCode::ACCEPTED);
    }
    let resp = server.post("/api/v1/hub/broadcast").await;
    resp.assert_status(StatusCode::ACCEPTED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["dropped_oldest"], true);
    assert_eq!(state.hub.stats().queued, capacity);
}

#[tokio::test]
async fn broadcast_after_shutdown_is_unavailable() {
    let state = common::test_state();
    let server = TestServer::new(common::test_app(&state)).unwrap();
    state.hub.shutdown();

    let resp = server.post("/api/v1/hub/broadcast").await;
    resp.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    assert_eq!(body["error"]["message"], "hub is shutting down");
}

// ---------------------------------------------------------------------------
// GET /api/v1/hub/stats
// ---------------------------------------------------------------------------

// ---------------------------------------------------------------------------
// GET /ws without an upgrade
// ---------------------------------------------------------------------------

#[tokio::test]
async fn plain_get_on_ws_is_rejected_without_registering() {
    let state = common::test_state();
    let server = TestServer::new(common::test_app(&state)).unwrap();

    for path in ["/ws", "/ws/random", "/ws/crawl"] {
        let resp = server.get(path).expect_failure().await;
        assert!(resp.status_code().is_client_error(), "{path}: {}", resp.status_code());
    }
    assert!(state.hub.registry().is_empty());
    assert_eq!(state.hub.stats().connections, 0);
}

#[tokio::test]
async fn stats_reflect_hub_state() {
    let state = common::test_state();
    let server = TestServer::new(common::test_app(&state)).unwrap();

    server.post("/api/v1/hub/broadcast").await;
    let resp = server.get("/api/v1/hub/stats").await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["connections"], 0);
    assert_eq!(body["queued"], 1);
    assert_eq!(body["queue_capacity"], state.config.queue_capacity);
    assert_eq!(body["dispatched"], 0);
    assert_eq!(body["broadcast_interval_secs"], 3600);
    assert!(body["started_at"].is_string());
}

#[test]
fn openapi_document_lists_routes() {
    use utoipa::OpenApi;

    let doc = lotto_hub::routes::ApiDoc::openapi();
    for path in ["/health", "/api/v1/draw", "/api/v1/hub/broadcast", "/api/v1/hub/stats"] {
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }
}
