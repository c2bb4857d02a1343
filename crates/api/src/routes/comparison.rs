//! Partner home/away and season comparison.

use analytics_core::{benchmark::validate_metrics, compare_partner, Error, PartnerComparison};
use axum::extract::State;
use serde::Deserialize;
use stats_store::EventQuery;
use telemetry::metrics;
use tracing::info;

use crate::extractors::{PathId, ValidQuery};
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

pub const DEFAULT_METRIC: &str = "totalFans";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComparisonQuery {
    pub metric: Option<String>,
}

/// GET /api/partners/:id/comparison - Home/away split and per-season buckets.
pub async fn comparison_handler(
    State(state): State<AppState>,
    PathId(partner_id): PathId,
    ValidQuery(query): ValidQuery<ComparisonQuery>,
) -> ApiResult<PartnerComparison> {
    let metric = query.metric.unwrap_or_else(|| DEFAULT_METRIC.to_string());
    validate_metrics(&[metric.as_str()])?;

    let events = state.store.events(&EventQuery::for_partner(&partner_id)).await?;
    if events.is_empty() {
        return Err(Error::not_found(format!("No events for partner '{}'", partner_id)).into());
    }

    let comparison = compare_partner(&partner_id, &events, &metric);
    metrics().comparisons_run.inc();

    info!(
        partner_id = %partner_id,
        metric = %metric,
        seasons = comparison.seasons.len(),
        "Compared partner performance"
    );
    Ok(ApiResponse::ok(comparison))
}
