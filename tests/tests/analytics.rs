//! Benchmark, insight and comparison endpoint tests.

use analytics_core::EventRecord;
use api::{ChartsConfig, InsightsConfig};
use axum::http::StatusCode;
use integration_tests::{fixtures, mocks::MockEventStore, setup::TestContext};
use serde_json::{json, Value};

fn female_events() -> Vec<EventRecord> {
    [10.0, 20.0, 30.0, 40.0]
        .iter()
        .enumerate()
        .map(|(i, female)| {
            EventRecord::new(format!("f{}", i + 1), "Match", fixtures::date(2024, 4, 1 + i as u32))
                .with_partner("ftc")
                .with_stats(fixtures::stats(&[("female", *female), ("male", 100.0)]))
        })
        .collect()
}

#[tokio::test]
async fn test_benchmark_interpolates_median() {
    let ctx = TestContext::with_data(female_events(), vec![]);
    let server = ctx.server();

    let response = server
        .post("/api/benchmarks")
        .json(&json!({ "metrics": ["female"] }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["population"], 4);
    let female = &body["data"]["distributions"][0];
    assert_eq!(female["metric"], "female");
    assert_eq!(female["sampleCount"], 4);
    assert_eq!(female["percentiles"]["p50"], 25.0);
    assert_eq!(female["percentiles"]["p25"], 17.5);
    assert!(body["data"].get("composite").is_none());
}

#[tokio::test]
async fn test_benchmark_scores_event() {
    let ctx = TestContext::with_data(female_events(), vec![]);
    let server = ctx.server();

    let response = server
        .post("/api/benchmarks")
        .json(&json!({ "metrics": ["female", "male"], "eventId": "f4" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["composite"]["score"], 100.0);
    assert_eq!(body["data"]["composite"]["metrics"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_benchmark_window_limits_population() {
    let ctx = TestContext::with_data(female_events(), vec![]);
    let server = ctx.server();

    let response = server
        .post("/api/benchmarks")
        .json(&json!({ "metrics": ["female"], "from": "2024-04-03" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["population"], 2);
    assert_eq!(body["data"]["distributions"][0]["min"], 30.0);
}

#[tokio::test]
async fn test_benchmark_rejects_bad_metrics() {
    let ctx = TestContext::with_data(female_events(), vec![]);
    let server = ctx.server();

    for metrics in [json!([]), json!(["fans"])] {
        let response = server
            .post("/api/benchmarks")
            .json(&json!({ "metrics": metrics }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALID_006");
    }
}

#[tokio::test]
async fn test_benchmark_unknown_event_is_not_found() {
    let ctx = TestContext::with_data(female_events(), vec![]);
    let server = ctx.server();

    let response = server
        .post("/api/benchmarks")
        .json(&json!({ "metrics": ["female"], "eventId": "nope" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_insights_flag_attendance_collapse() {
    let ctx = TestContext::with_data(fixtures::attendance_drop_events(), vec![]);
    let server = ctx.server();

    let response = server.get("/api/events/w4/insights").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["eventCount"], 1);
    assert_eq!(body["data"]["failedRules"], 0);

    let insights = body["data"]["insights"].as_array().unwrap();
    let trend = insights
        .iter()
        .find(|i| i["kind"] == "attendance_trend")
        .expect("attendance trend insight");
    assert_eq!(trend["priority"], "critical");
    assert_eq!(trend["eventId"], "w4");
    assert_eq!(trend["currentValue"], 500.0);
    assert_eq!(trend["baselineValue"], 1000.0);
    assert_eq!(ctx.store.history_lookups(), 1);
}

#[tokio::test]
async fn test_event_insights_unknown_event() {
    let server = TestContext::new().server();

    let response = server.get("/api/events/ghost/insights").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND_001");
}

#[tokio::test]
async fn test_partner_insights_look_up_history_once_per_event() {
    let ctx = TestContext::with_data(fixtures::attendance_drop_events(), vec![]);
    let server = ctx.server();

    let response = server.get("/api/partners/ftc/insights").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["eventCount"], 4);
    assert_eq!(ctx.store.history_lookups(), 4);
    assert!(body["data"]["insights"]
        .as_array()
        .unwrap()
        .iter()
        .any(|i| i["eventId"] == "w4" && i["priority"] == "critical"));
}

#[tokio::test]
async fn test_partner_insights_respect_event_cap() {
    let store = MockEventStore::new().with_events(fixtures::attendance_drop_events());
    let insights = InsightsConfig { max_events: 2 };
    let ctx = TestContext::with_config(store, &ChartsConfig::default(), insights);
    let server = ctx.server();

    let response = server.get("/api/partners/ftc/insights").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["eventCount"], 2);
    assert_eq!(ctx.store.history_lookups(), 2);
}

#[tokio::test]
async fn test_partner_insights_unknown_partner() {
    let ctx = TestContext::with_data(fixtures::attendance_drop_events(), vec![]);
    let server = ctx.server();

    let response = server.get("/api/partners/nobody/insights").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

/// Home average 500 against away average 400 is a 25% home advantage.
#[tokio::test]
async fn test_home_away_comparison() {
    let ctx = TestContext::with_data(fixtures::home_away_events(), vec![]);
    let server = ctx.server();

    let response = server.get("/api/partners/ftc/comparison").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let home_away = &body["data"]["homeAway"];
    assert_eq!(home_away["metric"], "totalFans");
    assert_eq!(home_away["home"]["average"], 500.0);
    assert_eq!(home_away["away"]["average"], 400.0);
    assert_eq!(home_away["advantage"], 0.25);
    assert!(home_away["summary"].as_str().unwrap().contains("+25.0%"));

    let seasons = body["data"]["seasons"].as_array().unwrap();
    assert_eq!(seasons.len(), 2);
    assert_eq!(seasons[0]["season"], "2023/24");
    assert_eq!(seasons[1]["season"], "2024/25");
    assert_eq!(seasons[1]["eventCount"], 4);
}

#[tokio::test]
async fn test_comparison_metric_parameter() {
    let ctx = TestContext::with_data(fixtures::home_away_events(), vec![]);
    let server = ctx.server();

    let response = server
        .get("/api/partners/ftc/comparison")
        .add_query_param("metric", "stadium")
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["homeAway"]["metric"], "stadium");

    let response = server
        .get("/api/partners/ftc/comparison")
        .add_query_param("metric", "bogus")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "VALID_006");
}

#[tokio::test]
async fn test_comparison_unknown_partner() {
    let ctx = TestContext::with_data(fixtures::home_away_events(), vec![]);
    let server = ctx.server();

    let response = server.get("/api/partners/nobody/comparison").await;
    response.assert_status(StatusCode::NOT_FOUND);
}
