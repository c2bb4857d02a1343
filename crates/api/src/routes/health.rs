//! Health check endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::time::Instant;
use telemetry::{health, metrics, HealthReport, MetricsSnapshot};

use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    #[serde(flatten)]
    pub report: HealthReport,
    pub version: &'static str,
    pub metrics: MetricsSnapshot,
}

/// Ping storage and record the result; returns whether it answered.
async fn refresh_storage_health(state: &AppState) -> bool {
    let start = Instant::now();
    let reachable = state.store.ping().await;
    if reachable {
        health().clickhouse.set_healthy(start.elapsed().as_millis() as u64);
    } else {
        health().clickhouse.set_unhealthy("storage ping failed");
    }
    reachable
}

/// GET /health - Full health report.
pub async fn health_handler(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    refresh_storage_health(&state).await;

    ApiResponse::ok(HealthResponse {
        report: health().report(),
        version: env!("CARGO_PKG_VERSION"),
        metrics: metrics().snapshot(),
    })
}

/// GET /health/ready - Readiness probe (storage reachable).
pub async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    if refresh_storage_health(&state).await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    if health().is_alive() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
