//! Request latency and in-flight tracking.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use telemetry::metrics;
use tracing::debug;

/// Record every request in the latency histogram.
pub async fn track_latency(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let path = request.uri().path().to_owned();
    metrics().requests_in_flight.inc();

    let response = next.run(request).await;

    metrics().requests_in_flight.dec();
    let latency_ms = start.elapsed().as_millis() as u64;
    metrics().request_latency_ms.observe(latency_ms);
    debug!(
        path = %path,
        status = response.status().as_u16(),
        latency_ms = latency_ms,
        "Request completed"
    );
    response
}
