//! Aggregation endpoint tests.

use axum::http::StatusCode;
use integration_tests::{fixtures, setup::TestContext};
use serde_json::json;

/// Two matching events with 100 and 150 stadium fans sum to 250.
#[tokio::test]
async fn test_hashtag_aggregate_sums_matching_events() {
    let ctx = TestContext::with_data(fixtures::budapest_events(), vec![]);
    let server = ctx.server();

    let response = server
        .post("/api/aggregate")
        .json(&json!({ "hashtags": ["#Budapest"] }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);

    let data = &body["data"];
    assert_eq!(data["eventCount"], 2);
    assert_eq!(data["stats"]["stadium"], 250.0);
    assert_eq!(data["stats"]["female"], 110.0);
    assert_eq!(data["eventIds"], json!(["bp-1", "bp-2"]));
    assert_eq!(data["dateRange"]["label"], "5 Jan 2024 - 28 Jan 2024");
    assert_eq!(data["dateRange"]["earliest"], "2024-01-05");
}

#[tokio::test]
async fn test_any_mode_unions_terms() {
    let ctx = TestContext::with_data(fixtures::budapest_events(), vec![]);
    let server = ctx.server();

    let response = server
        .post("/api/aggregate")
        .json(&json!({ "hashtags": ["derby", "vienna"], "matchMode": "any" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["eventCount"], 2);
    assert_eq!(body["data"]["stats"]["stadium"], 1099.0);
}

#[tokio::test]
async fn test_all_mode_requires_every_term() {
    let ctx = TestContext::with_data(fixtures::budapest_events(), vec![]);
    let server = ctx.server();

    let response = server
        .post("/api/aggregate")
        .json(&json!({ "hashtags": ["budapest", "derby"] }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["eventIds"], json!(["bp-1"]));
}

#[tokio::test]
async fn test_categorized_term_matches_only_its_category() {
    let ctx = TestContext::with_data(fixtures::budapest_events(), vec![]);
    let server = ctx.server();

    let response = server
        .post("/api/aggregate")
        .json(&json!({ "hashtags": ["city:vienna"] }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["eventIds"], json!(["vie-1"]));
}

#[tokio::test]
async fn test_partner_and_window_narrow_the_filter() {
    let ctx = TestContext::with_data(fixtures::budapest_events(), vec![]);
    let server = ctx.server();

    let response = server
        .post("/api/aggregate")
        .json(&json!({ "hashtags": ["budapest"], "partnerId": "mtk", "from": "2024-01-10" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["eventIds"], json!(["bp-2"]));
    assert_eq!(body["data"]["dateRange"]["label"], "28 Jan 2024");
}

#[tokio::test]
async fn test_no_match_is_not_found() {
    let ctx = TestContext::with_data(fixtures::budapest_events(), vec![]);
    let server = ctx.server();

    let response = server
        .post("/api/aggregate")
        .json(&json!({ "hashtags": ["london"] }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND_001");
}

#[tokio::test]
async fn test_partner_aggregate_counts_home_and_away() {
    let ctx = TestContext::with_data(fixtures::home_away_events(), vec![]);
    let server = ctx.server();

    let response = server.get("/api/partners/ftc/aggregate").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["eventCount"], 5);
    assert_eq!(body["data"]["stats"]["stadium"], 2300.0);

    let response = server
        .get("/api/partners/ftc/aggregate")
        .add_query_param("from", "2024-09-01")
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["eventCount"], 4);
    assert_eq!(body["data"]["stats"]["stadium"], 1800.0);
}

#[tokio::test]
async fn test_unknown_partner_is_not_found() {
    let ctx = TestContext::with_data(fixtures::home_away_events(), vec![]);
    let server = ctx.server();

    let response = server.get("/api/partners/nobody/aggregate").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND_001");
}

/// The aggregate of a single event equals that event's own counters.
#[tokio::test]
async fn test_single_event_aggregate_is_identity() {
    let counters = [("indoor", 12.0), ("outdoor", 3.0)];
    let event =
        fixtures::unique_event(fixtures::date(2024, 5, 1), &counters).with_hashtags(["solo"]);
    let ctx = TestContext::with_data(vec![event.clone()], vec![]);
    let server = ctx.server();

    let response = server
        .post("/api/aggregate")
        .json(&json!({ "hashtags": ["solo"] }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["stats"], json!({ "indoor": 12.0, "outdoor": 3.0 }));
    assert_eq!(body["data"]["eventIds"], json!([event.id]));
}
