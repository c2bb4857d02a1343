//! Error envelope tests.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::{json, Value};

fn assert_envelope(body: &Value, code: &str) {
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], code);
    assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn test_storage_failure_is_db_error() {
    let ctx = TestContext::with_data(fixtures::budapest_events(), fixtures::standard_charts());
    ctx.set_store_failure(true);
    let server = ctx.server();

    let response = server
        .post("/api/aggregate")
        .json(&json!({ "hashtags": ["budapest"] }))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_envelope(&body, "DB_001");
    assert_eq!(body["error"], "Storage unavailable");

    let response = server
        .post("/api/charts/calculate")
        .json(&json!({ "stats": { "female": 1 } }))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let response = server.get("/health/ready").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_store_recovers_after_failure() {
    let ctx = TestContext::with_data(fixtures::budapest_events(), vec![]);
    let server = ctx.server();

    ctx.set_store_failure(true);
    server
        .get("/api/partners/ftc/aggregate")
        .await
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    ctx.set_store_failure(false);
    server.get("/api/partners/ftc/aggregate").await.assert_status_ok();
}

#[tokio::test]
async fn test_malformed_json() {
    let server = TestContext::new().server();

    let response = server
        .post("/api/aggregate")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_envelope(&body, "VALID_001");
}

#[tokio::test]
async fn test_wrong_field_type() {
    let server = TestContext::new().server();

    let response = server
        .post("/api/aggregate")
        .json(&json!({ "hashtags": "budapest" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_envelope(&body, "VALID_001");
}

#[tokio::test]
async fn test_empty_filter() {
    let server = TestContext::new().server();

    for hashtags in [json!([]), json!(["  ", "#"])] {
        let response = server
            .post("/api/aggregate")
            .json(&json!({ "hashtags": hashtags }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_envelope(&body, "VALID_002");
    }
}

#[tokio::test]
async fn test_inverted_window() {
    let ctx = TestContext::with_data(fixtures::budapest_events(), vec![]);
    let server = ctx.server();

    let response = server
        .post("/api/aggregate")
        .json(&json!({ "hashtags": ["budapest"], "from": "2024-02-01", "to": "2024-01-01" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_envelope(&body, "VALID_001");

    let response = server
        .get("/api/partners/ftc/aggregate")
        .add_query_param("from", "2024-02-01")
        .add_query_param("to", "2024-01-01")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_query_date() {
    let ctx = TestContext::with_data(fixtures::budapest_events(), vec![]);
    let server = ctx.server();

    let response = server
        .get("/api/partners/ftc/aggregate")
        .add_query_param("from", "yesterday")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_envelope(&body, "VALID_001");
}

#[tokio::test]
async fn test_unknown_route() {
    let server = TestContext::new().server();

    let response = server.get("/api/nothing-here").await;
    response.assert_status(StatusCode::NOT_FOUND);
}
