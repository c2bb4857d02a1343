//! Chart calculation and validation endpoint tests.

use analytics_core::ChartType;
use api::{ChartCache, ChartsConfig};
use axum::http::StatusCode;
use integration_tests::{fixtures, mocks::MockEventStore, setup::TestContext};
use serde_json::{json, Value};

fn chart_ids(body: &Value) -> Vec<String> {
    body["data"]["charts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["chartId"].as_str().unwrap().to_string())
        .collect()
}

fn context() -> TestContext {
    TestContext::with_data(fixtures::budapest_events(), fixtures::standard_charts())
}

#[tokio::test]
async fn test_inline_stats_hide_charts_without_data() {
    let server = context().server();

    let response = server
        .post("/api/charts/calculate")
        .json(&json!({ "stats": { "female": 40, "male": 60, "stadium": 500 } }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(chart_ids(&body), vec!["gender", "fans"]);
    assert_eq!(body["data"]["hidden"], json!(["attendees"]));
    assert_eq!(body["data"]["source"]["kind"], "stats");

    let gender = &body["data"]["charts"][0];
    assert_eq!(gender["type"], "pie");
    assert_eq!(gender["subtitle"], "Total: 100");
    assert_eq!(gender["elements"][0]["value"], 40.0);

    let fans = &body["data"]["charts"][1];
    assert_eq!(fans["elements"][0]["value"], 500.0);
}

#[tokio::test]
async fn test_include_hidden_returns_na_values() {
    let server = context().server();

    let response = server
        .post("/api/charts/calculate")
        .json(&json!({
            "stats": { "female": 40, "male": 60 },
            "chartIds": ["attendees"],
            "includeHidden": true
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(chart_ids(&body), vec!["attendees"]);
    let attendees = &body["data"]["charts"][0];
    assert_eq!(attendees["displayable"], false);
    assert_eq!(attendees["elements"][0]["value"], "NA");
    assert_eq!(body["data"]["hidden"], json!([]));
}

#[tokio::test]
async fn test_broken_configuration_is_reported_not_fatal() {
    let server = context().server();

    let response = server
        .post("/api/charts/calculate")
        .json(&json!({ "stats": { "female": 1 } }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    let rejected = body["data"]["rejected"].as_array().unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0]["chartId"], "broken");
    assert_eq!(rejected[0]["code"], "VALID_004");
    assert!(!chart_ids(&body).contains(&"broken".to_string()));
}

#[tokio::test]
async fn test_event_source() {
    let server = context().server();

    let response = server
        .post("/api/charts/calculate")
        .json(&json!({ "eventId": "bp-1", "chartIds": ["gender"] }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["source"]["kind"], "event");
    assert_eq!(body["data"]["source"]["eventIds"], json!(["bp-1"]));
    assert_eq!(body["data"]["charts"][0]["elements"][1]["value"], 60.0);
    assert_eq!(body["data"]["rejected"], json!([]));
}

#[tokio::test]
async fn test_filter_source_aggregates_before_calculating() {
    let server = context().server();

    let response = server
        .post("/api/charts/calculate")
        .json(&json!({ "filter": { "hashtags": ["budapest"] }, "chartIds": ["fans"] }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["source"]["kind"], "filter");
    assert_eq!(body["data"]["source"]["eventCount"], 2);
    assert_eq!(body["data"]["source"]["dateRange"], "5 Jan 2024 - 28 Jan 2024");
    assert_eq!(body["data"]["charts"][0]["elements"][0]["value"], 250.0);
}

#[tokio::test]
async fn test_source_must_be_exactly_one() {
    let server = context().server();

    let response = server.post("/api/charts/calculate").json(&json!({})).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_001");

    let response = server
        .post("/api/charts/calculate")
        .json(&json!({ "eventId": "bp-1", "stats": { "female": 1 } }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}

#[tokio::test]
async fn test_negative_stat_is_rejected() {
    let server = context().server();

    let response = server
        .post("/api/charts/calculate")
        .json(&json!({ "stats": { "female": -3 } }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_005");
}

#[tokio::test]
async fn test_unknown_event_is_not_found() {
    let server = context().server();

    let response = server
        .post("/api/charts/calculate")
        .json(&json!({ "eventId": "missing" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND_001");
}

#[tokio::test]
async fn test_compiled_charts_are_cached() {
    let ctx = context();
    let server = ctx.server();

    for _ in 0..3 {
        server
            .post("/api/charts/calculate")
            .json(&json!({ "stats": { "female": 1 } }))
            .await
            .assert_status_ok();
    }

    assert_eq!(ctx.store.chart_loads(), 1);
}

#[tokio::test]
async fn test_invalidate_reloads_configurations() {
    let store = MockEventStore::new().with_charts(fixtures::standard_charts());
    let cache = ChartCache::new(&ChartsConfig::default());

    let first = cache.active(&store).await.unwrap();
    assert_eq!(first.charts.len(), 3);
    assert_eq!(first.rejected.len(), 1);

    store.set_charts(vec![fixtures::chart(
        "fans",
        ChartType::Kpi,
        1,
        vec![fixtures::element("fans", "totalFans")],
    )]);
    assert_eq!(cache.active(&store).await.unwrap().charts.len(), 3);

    cache.invalidate().await;
    let reloaded = cache.active(&store).await.unwrap();
    assert_eq!(reloaded.charts.len(), 1);
    assert!(reloaded.rejected.is_empty());
    assert_eq!(store.chart_loads(), 2);
}

#[tokio::test]
async fn test_validate_valid_pie() {
    let server = TestContext::new().server();

    let response = server
        .post("/api/charts/validate")
        .json(&json!({
            "chartId": "gender",
            "title": "Gender",
            "type": "pie",
            "elements": [
                { "id": "f", "label": "Female", "formula": "stats.female", "color": "#f472b6" },
                { "id": "m", "label": "Male", "formula": "male", "color": "#3b82f6" }
            ]
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["type"], "pie");
    assert_eq!(body["data"]["fields"], json!(["female", "male"]));
    assert_eq!(body["data"]["elements"][0]["format"], "count");
}

#[tokio::test]
async fn test_validate_infers_percentage_format() {
    let server = TestContext::new().server();

    let response = server
        .post("/api/charts/validate")
        .json(&json!({
            "chartId": "share",
            "title": "Female share",
            "type": "kpi",
            "elements": [
                {
                    "id": "share",
                    "label": "Share",
                    "formula": "PERCENT(female, female + male)",
                    "color": "#f472b6"
                }
            ]
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["elements"][0]["format"], "percentage");
    assert_eq!(body["data"]["fields"], json!(["female", "male"]));
}

#[tokio::test]
async fn test_validate_rejects_wrong_element_count() {
    let server = TestContext::new().server();

    let element = json!({ "id": "x", "label": "X", "formula": "female", "color": "#000000" });
    let mut elements = vec![element.clone(), element.clone(), element];
    for (i, e) in elements.iter_mut().enumerate() {
        e["id"] = json!(format!("x{}", i));
    }

    let response = server
        .post("/api/charts/validate")
        .json(&json!({ "chartId": "pie3", "title": "Pie", "type": "pie", "elements": elements }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALID_003");
}

#[tokio::test]
async fn test_validate_rejects_bad_formula() {
    let server = TestContext::new().server();

    let response = server
        .post("/api/charts/validate")
        .json(&json!({
            "chartId": "kpi",
            "title": "KPI",
            "type": "kpi",
            "elements": [
                { "id": "k", "label": "K", "formula": "female * (male", "color": "#000000" }
            ]
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_004");
}

#[tokio::test]
async fn test_validate_rejects_unknown_type() {
    let server = TestContext::new().server();

    let response = server
        .post("/api/charts/validate")
        .json(&json!({ "chartId": "x", "title": "X", "type": "radar", "elements": [] }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_001");
}
