//! ClickHouse-backed [`EventStore`].

use crate::client::ClickHouseClient;
use crate::health::check_connection;
use crate::rows::{decode_rows, ChartRow, EventRow, CHART_COLUMNS, EVENT_COLUMNS};
use crate::source::{EventQuery, EventStore};
use analytics_core::{ChartConfiguration, Error, EventRecord, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Instant;
use telemetry::metrics;
use tracing::debug;

/// Reads events and chart configurations from ClickHouse.
#[derive(Clone)]
pub struct ClickHouseEventStore {
    client: ClickHouseClient,
}

impl ClickHouseEventStore {
    pub fn new(client: ClickHouseClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ClickHouseClient {
        &self.client
    }

    async fn fetch_events(&self, sql: &str, binds: Vec<Bind>) -> Result<Vec<EventRecord>> {
        let start = Instant::now();
        let mut query = self.client.inner().query(sql);
        for bind in binds {
            query = match bind {
                Bind::Text(v) => query.bind(v),
                Bind::Count(v) => query.bind(v),
            };
        }

        metrics().store_queries.inc();
        let rows: Vec<EventRow> = query.fetch_all().await.map_err(|e| {
            metrics().store_errors.inc();
            Error::database(format!("Query error: {}", e))
        })?;
        metrics().store_latency_ms.observe(start.elapsed().as_millis() as u64);

        let (events, skipped) = decode_rows(rows, |r: &EventRow| r.event_id.clone());
        metrics().rows_skipped.inc_by(skipped.len() as u64);
        debug!(
            rows = events.len(),
            skipped = skipped.len(),
            latency_ms = %start.elapsed().as_millis(),
            "Fetched events"
        );
        Ok(events)
    }
}

/// Values bound to `?` placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
enum Bind {
    Text(String),
    Count(u64),
}

/// `SELECT` for an [`EventQuery`] plus its bind values.
fn events_sql(query: &EventQuery) -> (String, Vec<Bind>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(partner) = &query.partner_id {
        conditions.push("(partner_id = ? OR opponent_id = ?)");
        binds.push(Bind::Text(partner.clone()));
        binds.push(Bind::Text(partner.clone()));
    }
    if let Some(from) = query.window.from {
        conditions.push("event_date >= toDate(?)");
        binds.push(Bind::Text(from.to_string()));
    }
    if let Some(to) = query.window.to {
        conditions.push("event_date <= toDate(?)");
        binds.push(Bind::Text(to.to_string()));
    }

    let mut sql = format!("SELECT {} FROM events FINAL", EVENT_COLUMNS);
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(" ORDER BY event_date DESC, event_id ASC");
    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        binds.push(Bind::Count(limit as u64));
    }
    (sql, binds)
}

#[async_trait]
impl EventStore for ClickHouseEventStore {
    async fn events(&self, query: &EventQuery) -> Result<Vec<EventRecord>> {
        let (sql, binds) = events_sql(query);
        self.fetch_events(&sql, binds).await
    }

    async fn event(&self, event_id: &str) -> Result<Option<EventRecord>> {
        let sql = format!("SELECT {} FROM events FINAL WHERE event_id = ? LIMIT 1", EVENT_COLUMNS);
        let events = self
            .fetch_events(&sql, vec![Bind::Text(event_id.to_string())])
            .await?;
        Ok(events.into_iter().next())
    }

    async fn partner_history(
        &self,
        partner_id: &str,
        before: NaiveDate,
        limit: usize,
    ) -> Result<Vec<EventRecord>> {
        let sql = format!(
            "SELECT {} FROM events FINAL \
             WHERE (partner_id = ? OR opponent_id = ?) AND event_date < toDate(?) \
             ORDER BY event_date DESC, event_id ASC LIMIT ?",
            EVENT_COLUMNS
        );
        let binds = vec![
            Bind::Text(partner_id.to_string()),
            Bind::Text(partner_id.to_string()),
            Bind::Text(before.to_string()),
            Bind::Count(limit as u64),
        ];
        self.fetch_events(&sql, binds).await
    }

    async fn chart_configurations(&self) -> Result<Vec<ChartConfiguration>> {
        let start = Instant::now();
        metrics().store_queries.inc();
        let rows: Vec<ChartRow> = self
            .client
            .inner()
            .query(&format!(
                "SELECT {} FROM chart_configurations FINAL ORDER BY display_order, chart_id",
                CHART_COLUMNS
            ))
            .fetch_all()
            .await
            .map_err(|e| {
                metrics().store_errors.inc();
                Error::database(format!("Query error: {}", e))
            })?;
        metrics().store_latency_ms.observe(start.elapsed().as_millis() as u64);

        let (configs, skipped) = decode_rows(rows, |r: &ChartRow| r.chart_id.clone());
        metrics().rows_skipped.inc_by(skipped.len() as u64);
        Ok(configs)
    }

    async fn ping(&self) -> bool {
        check_connection(&self.client).await
    }
}
