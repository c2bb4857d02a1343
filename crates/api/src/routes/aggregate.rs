//! Aggregation endpoints.

use analytics_core::{
    aggregate, aggregate_matching, AggregateRecord, DateWindow, Error, EventPredicate,
    HashtagFilter, MatchMode, Result,
};
use axum::extract::State;
use chrono::NaiveDate;
use serde::Deserialize;
use stats_store::EventQuery;
use telemetry::metrics;
use tracing::{debug, info};

use crate::extractors::{PathId, ValidJson, ValidQuery};
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Hashtag filter with optional partner and date bounds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    #[serde(default)]
    pub hashtags: Vec<String>,
    #[serde(default)]
    pub match_mode: MatchMode,
    pub partner_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl FilterRequest {
    /// Validated predicate; an empty hashtag list is `VALID_002`.
    pub fn predicate(&self) -> Result<EventPredicate> {
        let filter = HashtagFilter::parse(&self.hashtags, self.match_mode)?;
        let window = DateWindow::new(self.from, self.to)?;
        let mut predicate = EventPredicate::hashtags(filter).within(window);
        predicate.partner_id = self.partner_id.clone().filter(|p| !p.trim().is_empty());
        Ok(predicate)
    }
}

/// Optional `from` / `to` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl WindowQuery {
    pub fn window(&self) -> Result<DateWindow> {
        DateWindow::new(self.from, self.to)
    }
}

fn record_aggregation(record: &AggregateRecord) {
    metrics().aggregations_run.inc();
    metrics().events_aggregated.inc_by(record.event_count as u64);
}

/// Load and aggregate everything matching `predicate`.
pub(crate) async fn aggregate_filter(
    state: &AppState,
    predicate: &EventPredicate,
) -> Result<AggregateRecord> {
    let events = state.store.events(&EventQuery::for_predicate(predicate)).await?;
    debug!(candidates = events.len(), "Loaded candidate events");

    let record = aggregate_matching(&events, predicate)
        .ok_or_else(|| Error::not_found("No events match the filter"))?;
    record_aggregation(&record);
    Ok(record)
}

/// POST /api/aggregate - Aggregate events by hashtag filter.
pub async fn aggregate_handler(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<FilterRequest>,
) -> ApiResult<AggregateRecord> {
    let predicate = request.predicate()?;
    let record = aggregate_filter(&state, &predicate).await?;

    info!(
        terms = request.hashtags.len(),
        match_mode = ?request.match_mode,
        event_count = record.event_count,
        "Aggregated by hashtags"
    );
    Ok(ApiResponse::ok(record))
}

/// GET /api/partners/:id/aggregate - Aggregate a partner's home and away events.
pub async fn partner_aggregate_handler(
    State(state): State<AppState>,
    PathId(partner_id): PathId,
    ValidQuery(query): ValidQuery<WindowQuery>,
) -> ApiResult<AggregateRecord> {
    let query = EventQuery::for_partner(&partner_id).within(query.window()?);
    let events = state.store.events(&query).await?;

    let record = aggregate(&events)
        .ok_or_else(|| Error::not_found(format!("No events for partner '{}'", partner_id)))?;
    record_aggregation(&record);

    info!(partner_id = %partner_id, event_count = record.event_count, "Aggregated partner events");
    Ok(ApiResponse::ok(record))
}
