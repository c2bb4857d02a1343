//! Insight endpoints.

use analytics_core::{
    evaluate_batch, evaluate_event, limits::MAX_INSIGHT_HISTORY, Error, EventRecord, InsightReport,
    Result,
};
use axum::extract::State;
use serde::Serialize;
use stats_store::EventQuery;
use telemetry::metrics;
use tracing::{debug, info};

use crate::extractors::PathId;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsResponse {
    /// Events evaluated.
    pub event_count: usize,
    #[serde(flatten)]
    pub report: InsightReport,
}

fn record_report(report: &InsightReport) {
    metrics().insights_generated.inc_by(report.insights.len() as u64);
    metrics().insight_rule_failures.inc_by(report.failed_rules as u64);
    metrics().insight_events_skipped.inc_by(report.skipped_events.len() as u64);
}

/// Earlier events of the event's home partner; one storage call.
async fn history_for(state: &AppState, event: &EventRecord) -> Result<Vec<EventRecord>> {
    match event.partner_id.as_deref() {
        Some(partner) => {
            state
                .store
                .partner_history(partner, event.date, MAX_INSIGHT_HISTORY)
                .await
        }
        None => Ok(Vec::new()),
    }
}

/// GET /api/events/:id/insights - Insights for one event.
pub async fn event_insights_handler(
    State(state): State<AppState>,
    PathId(event_id): PathId,
) -> ApiResult<InsightsResponse> {
    let event = state
        .store
        .event(&event_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Event '{}' not found", event_id)))?;
    let history = history_for(&state, &event).await?;

    let report = evaluate_event(&event, &history, &state.rules)?;
    record_report(&report);

    info!(
        event_id = %event_id,
        history = history.len(),
        insights = report.insights.len(),
        failed_rules = report.failed_rules,
        "Generated event insights"
    );
    Ok(ApiResponse::ok(InsightsResponse {
        event_count: 1,
        report,
    }))
}

/// GET /api/partners/:id/insights - Insights for a partner's latest events.
pub async fn partner_insights_handler(
    State(state): State<AppState>,
    PathId(partner_id): PathId,
) -> ApiResult<InsightsResponse> {
    let query = EventQuery::for_partner(&partner_id).limit(state.max_insight_events());
    let events = state.store.events(&query).await?;
    if events.is_empty() {
        return Err(Error::not_found(format!("No events for partner '{}'", partner_id)).into());
    }

    let mut items = Vec::with_capacity(events.len());
    for event in events {
        let history = history_for(&state, &event).await?;
        debug!(event_id = %event.id, history = history.len(), "Loaded insight history");
        items.push((event, history));
    }

    let report = evaluate_batch(&items, &state.rules);
    record_report(&report);

    info!(
        partner_id = %partner_id,
        events = items.len(),
        insights = report.insights.len(),
        skipped = report.skipped_events.len(),
        "Generated partner insights"
    );
    Ok(ApiResponse::ok(InsightsResponse {
        event_count: items.len(),
        report,
    }))
}
