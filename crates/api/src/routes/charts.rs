//! Chart calculation and configuration validation endpoints.

use analytics_core::{
    calculate_chart, format::ValueFormat, AggregateRecord, ChartCalculationResult,
    ChartConfiguration, ChartType, Error, Result, StatRecord,
};
use axum::extract::State;
use serde::{Deserialize, Serialize};
use telemetry::metrics;
use tracing::{debug, info};

use super::aggregate::{aggregate_filter, FilterRequest};
use crate::extractors::ValidJson;
use crate::response::{ApiResponse, ApiResult};
use crate::state::AppState;

/// Exactly one of `eventId`, `filter` or `stats` selects the data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    pub event_id: Option<String>,
    pub filter: Option<FilterRequest>,
    pub stats: Option<StatRecord>,
    /// Restrict to these charts; empty means every active chart.
    #[serde(default)]
    pub chart_ids: Vec<String>,
    /// Also return charts that have nothing to show.
    #[serde(default)]
    pub include_hidden: bool,
}

/// Where the calculated numbers came from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSource {
    pub kind: &'static str,
    pub event_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<String>,
    pub event_ids: Vec<String>,
}

impl DataSource {
    fn from_aggregate(kind: &'static str, record: &AggregateRecord) -> Self {
        Self {
            kind,
            event_count: record.event_count,
            date_range: Some(record.date_range.label.clone()),
            event_ids: record.event_ids.clone(),
        }
    }

    fn inline() -> Self {
        Self {
            kind: "stats",
            event_count: 0,
            date_range: None,
            event_ids: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedChart {
    pub chart_id: String,
    pub code: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    pub source: DataSource,
    pub charts: Vec<ChartCalculationResult>,
    /// Charts left out because none of their elements had data.
    pub hidden: Vec<String>,
    /// Stored configurations that failed to compile.
    pub rejected: Vec<RejectedChart>,
}

async fn resolve_source(
    state: &AppState,
    request: CalculateRequest,
) -> Result<(DataSource, StatRecord)> {
    match (request.event_id, request.filter, request.stats) {
        (Some(event_id), None, None) => {
            let event = state
                .store
                .event(&event_id)
                .await?
                .ok_or_else(|| Error::not_found(format!("Event '{}' not found", event_id)))?;
            event.stats.validate()?;
            let record = AggregateRecord::single(&event);
            Ok((DataSource::from_aggregate("event", &record), record.stats))
        }
        (None, Some(filter), None) => {
            let record = aggregate_filter(state, &filter.predicate()?).await?;
            Ok((DataSource::from_aggregate("filter", &record), record.stats))
        }
        (None, None, Some(stats)) => {
            stats.validate()?;
            Ok((DataSource::inline(), stats))
        }
        _ => Err(Error::invalid_format(
            "exactly one of eventId, filter or stats is required",
        )),
    }
}

/// POST /api/charts/calculate - Evaluate active charts against one data source.
pub async fn calculate_handler(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CalculateRequest>,
) -> ApiResult<CalculateResponse> {
    let chart_ids = request.chart_ids.clone();
    let include_hidden = request.include_hidden;

    let (source, stats) = resolve_source(&state, request).await?;
    let compiled = state.charts.active(state.store.as_ref()).await?;

    let mut charts = Vec::new();
    let mut hidden = Vec::new();
    for chart in compiled
        .charts
        .iter()
        .filter(|c| chart_ids.is_empty() || chart_ids.contains(&c.chart_id))
    {
        let result = calculate_chart(chart, &stats);
        if result.displayable || include_hidden {
            charts.push(result);
        } else {
            hidden.push(result.chart_id);
        }
    }
    metrics().charts_calculated.inc_by((charts.len() + hidden.len()) as u64);

    let rejected = compiled
        .rejected
        .iter()
        .filter(|(id, _)| chart_ids.is_empty() || chart_ids.contains(id))
        .map(|(chart_id, err)| RejectedChart {
            chart_id: chart_id.clone(),
            code: err.error_code().to_string(),
            error: err.message(),
        })
        .collect();

    info!(
        source = source.kind,
        calculated = charts.len(),
        hidden = hidden.len(),
        "Calculated charts"
    );
    Ok(ApiResponse::ok(CalculateResponse {
        source,
        charts,
        hidden,
        rejected,
    }))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedElement {
    pub id: String,
    /// Formula in canonical form.
    pub formula: String,
    pub format: ValueFormat,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub chart_id: String,
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub elements: Vec<ValidatedElement>,
    pub fields: Vec<String>,
}

/// POST /api/charts/validate - Compile one configuration without storing it.
pub async fn validate_handler(
    ValidJson(config): ValidJson<ChartConfiguration>,
) -> ApiResult<ValidateResponse> {
    let chart = config.compile()?;
    debug!(chart_id = %chart.chart_id, "Chart configuration is valid");

    let elements = chart
        .elements
        .iter()
        .map(|e| ValidatedElement {
            id: e.id.clone(),
            formula: e.formula.to_string(),
            format: e.format,
            fields: e.formula.fields().into_iter().map(String::from).collect(),
        })
        .collect();

    Ok(ApiResponse::ok(ValidateResponse {
        chart_id: chart.chart_id.clone(),
        chart_type: chart.chart_type,
        fields: chart.fields().into_iter().map(String::from).collect(),
        elements,
    }))
}
