//! ClickHouse table schemas.
//!
//! Both tables use `ReplacingMergeTree` so re-seeding an event or chart
//! replaces the earlier version; reads go through `FINAL`.

use crate::client::ClickHouseClient;
use analytics_core::{Error, Result};
use tracing::debug;

/// One row per event. Counters and categorized hashtags are JSON documents
/// because their key sets vary from event to event.
pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    event_id String,
    event_name String,
    event_date Date,

    -- Home and away partners
    partner_id Nullable(String),
    opponent_id Nullable(String),

    -- Tags
    hashtags Array(String),
    categorized_hashtags String,

    -- StatRecord as a JSON object of camelCase counters
    stats String,

    updated_at DateTime DEFAULT now()
)
ENGINE = ReplacingMergeTree(updated_at)
PARTITION BY toYear(event_date)
ORDER BY event_id
SETTINGS index_granularity = 8192
"#;

/// Chart configurations. `elements` holds the JSON element array.
pub const CREATE_CHART_CONFIGURATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS chart_configurations (
    chart_id String,
    title String,
    subtitle Nullable(String),
    chart_type LowCardinality(String),
    elements String,
    display_order Int32,
    is_active UInt8,

    updated_at DateTime DEFAULT now()
)
ENGINE = ReplacingMergeTree(updated_at)
ORDER BY chart_id
"#;

/// `CREATE DATABASE` statement for the configured database.
pub fn create_database(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", database)
}

/// All table DDL in creation order.
pub fn all_tables() -> Vec<&'static str> {
    vec![CREATE_EVENTS_TABLE, CREATE_CHART_CONFIGURATIONS_TABLE]
}

/// Initialize the database schema.
///
/// Creates the database and all tables if they don't exist.
pub async fn init_schema(client: &ClickHouseClient) -> Result<()> {
    let database = &client.config().database;
    client
        .server()
        .query(&create_database(database))
        .execute()
        .await
        .map_err(|e| Error::database(format!("Schema init error: {}", e)))?;

    for sql in all_tables() {
        client
            .inner()
            .query(sql)
            .execute()
            .await
            .map_err(|e| Error::database(format!("Schema init error: {}", e)))?;
    }

    debug!(database = %database, "ClickHouse schema initialized");
    Ok(())
}
