//! Batch inserts used to seed events and chart configurations.

use crate::client::ClickHouseClient;
use crate::rows::{ChartRow, EventRow};
use analytics_core::{ChartConfiguration, Error, EventRecord, Result};
use clickhouse::Row;
use serde::Serialize;
use telemetry::metrics;
use tracing::debug;

async fn insert_rows<T>(client: &ClickHouseClient, table: &str, rows: &[T]) -> Result<usize>
where
    T: Row + Serialize,
{
    if rows.is_empty() {
        return Ok(0);
    }
    let start = std::time::Instant::now();

    let mut insert = client.inner().insert(table).map_err(|e| {
        metrics().store_errors.inc();
        Error::database(format!("Insert error: {}", e))
    })?;

    for row in rows {
        insert.write(row).await.map_err(|e| {
            metrics().store_errors.inc();
            Error::database(format!("Write error: {}", e))
        })?;
    }

    insert.end().await.map_err(|e| {
        metrics().store_errors.inc();
        Error::database(format!("End error: {}", e))
    })?;

    let elapsed = start.elapsed();
    metrics().store_latency_ms.observe(elapsed.as_millis() as u64);
    debug!(
        table = table,
        count = rows.len(),
        latency_ms = %elapsed.as_millis(),
        "Inserted rows"
    );
    Ok(rows.len())
}

/// Insert or replace events. Fails before writing if any event is invalid.
pub async fn insert_events(client: &ClickHouseClient, events: &[EventRecord]) -> Result<usize> {
    let rows = events.iter().map(EventRow::try_from).collect::<Result<Vec<_>>>()?;
    insert_rows(client, "events", &rows).await
}

/// Insert or replace chart configurations. Each one must compile.
pub async fn insert_chart_configurations(
    client: &ClickHouseClient,
    configs: &[ChartConfiguration],
) -> Result<usize> {
    let rows = configs
        .iter()
        .map(|config| {
            config.compile()?;
            ChartRow::try_from(config)
        })
        .collect::<Result<Vec<_>>>()?;
    insert_rows(client, "chart_configurations", &rows).await
}
