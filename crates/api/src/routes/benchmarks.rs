//! Benchmark distributions.

use analytics_core::{
    benchmark::validate_metrics, benchmark, composite_score, AggregateRecord, BenchmarkDistribution,
    CompositeScore, DateWindow, Error,
};
use axum::extract::State;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use stats_store::EventQuery;
use telemetry::metrics;
use tracing::info;

use crate::extractors::ValidJson;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Metrics to benchmark over a population of events.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkRequest {
    pub metrics: Vec<String>,
    /// Limit the population to one partner's events.
    pub partner_id: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Score this event against the distributions.
    pub event_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResponse {
    /// Events in the population.
    pub population: usize,
    pub distributions: Vec<BenchmarkDistribution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite: Option<CompositeScore>,
}

/// POST /api/benchmarks - Percentile distributions per metric.
pub async fn benchmark_handler(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<BenchmarkRequest>,
) -> ApiResult<BenchmarkResponse> {
    validate_metrics(&request.metrics)?;
    let window = DateWindow::new(request.from, request.to)?;

    let mut query = EventQuery::all().within(window);
    query.partner_id = request.partner_id.clone();
    let events = state.store.events(&query).await?;

    let records: Vec<AggregateRecord> = events.iter().map(AggregateRecord::single).collect();
    let distributions = benchmark(&records, &request.metrics);
    metrics().benchmarks_run.inc();

    let composite = match &request.event_id {
        Some(event_id) => {
            let event = state
                .store
                .event(event_id)
                .await?
                .ok_or_else(|| Error::not_found(format!("Event '{}' not found", event_id)))?;
            composite_score(&AggregateRecord::single(&event), &distributions)
        }
        None => None,
    };

    info!(
        population = records.len(),
        metrics = request.metrics.len(),
        distributions = distributions.len(),
        scored = composite.is_some(),
        "Computed benchmarks"
    );
    Ok(ApiResponse::ok(BenchmarkResponse {
        population: records.len(),
        distributions,
        composite,
    }))
}
