//! API routes.

pub mod aggregate;
pub mod benchmarks;
pub mod charts;
pub mod comparison;
pub mod health;
pub mod insights;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::track_latency;
use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/aggregate", post(aggregate::aggregate_handler))
        .route("/partners/:id/aggregate", get(aggregate::partner_aggregate_handler))
        .route("/partners/:id/insights", get(insights::partner_insights_handler))
        .route("/partners/:id/comparison", get(comparison::comparison_handler))
        .route("/events/:id/insights", get(insights::event_insights_handler))
        .route("/charts/calculate", post(charts::calculate_handler))
        .route("/charts/validate", post(charts::validate_handler))
        .route("/benchmarks", post(benchmarks::benchmark_handler));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new())
                .layer(middleware::from_fn(track_latency)),
        )
        .with_state(state)
}
