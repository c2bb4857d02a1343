//! Tests for health check endpoints.

use axum::http::StatusCode;
use integration_tests::setup::TestContext;

#[tokio::test]
async fn test_health_endpoint_structure() {
    let server = TestContext::new().server();

    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert!(data.get("status").is_some(), "Response should have 'status' field");
    assert!(data.get("version").is_some(), "Response should have 'version' field");
    assert!(data["metrics"].get("requestsInFlight").is_some());

    let components = data["components"].as_array().unwrap();
    assert_eq!(components.len(), 1);
    assert_eq!(components[0]["name"], "clickhouse");
}

#[tokio::test]
async fn test_health_reports_reachable_storage() {
    let server = TestContext::new().server();

    let response = server.get("/health").await;
    let body: serde_json::Value = response.json();
    assert_ne!(body["data"]["components"][0]["status"], "unhealthy");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let server = TestContext::new().server();

    let response = server.get("/health/ready").await;
    response.assert_status(StatusCode::OK);
}

#[tokio::test]
async fn test_live_endpoint() {
    let server = TestContext::new().server();

    let response = server.get("/health/live").await;
    response.assert_status(StatusCode::OK);
}
