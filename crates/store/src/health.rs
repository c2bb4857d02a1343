//! ClickHouse health checks.

use crate::client::ClickHouseClient;
use telemetry::health;
use tracing::{debug, error};

/// Check ClickHouse connection health.
pub async fn check_connection(client: &ClickHouseClient) -> bool {
    match client.inner().query("SELECT 1").fetch_one::<u8>().await {
        Ok(_) => {
            debug!("ClickHouse connection healthy");
            true
        }
        Err(e) => {
            error!("ClickHouse health check failed: {}", e);
            false
        }
    }
}

/// Ping ClickHouse and record the outcome in the health registry.
pub async fn refresh_health(client: &ClickHouseClient) -> bool {
    let start = std::time::Instant::now();
    let healthy = check_connection(client).await;

    if healthy {
        health().clickhouse.set_healthy(start.elapsed().as_millis() as u64);
    } else {
        health().clickhouse.set_unhealthy("connection check failed");
    }
    healthy
}
