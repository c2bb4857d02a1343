//! Mock implementations for testing.

use analytics_core::{ChartConfiguration, Error, EventRecord, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use stats_store::{source::newest_first, EventQuery, EventStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory store implementing the same `EventStore` trait as ClickHouse.
#[derive(Clone, Default)]
pub struct MockEventStore {
    events: Arc<Mutex<Vec<EventRecord>>>,
    charts: Arc<Mutex<Vec<ChartConfiguration>>>,
    /// Simulate failures if set.
    should_fail: Arc<Mutex<bool>>,
    chart_loads: Arc<AtomicUsize>,
    history_lookups: Arc<AtomicUsize>,
}

impl MockEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(self, events: Vec<EventRecord>) -> Self {
        self.events.lock().extend(events);
        self
    }

    pub fn with_charts(self, charts: Vec<ChartConfiguration>) -> Self {
        self.charts.lock().extend(charts);
        self
    }

    pub fn add_event(&self, event: EventRecord) {
        self.events.lock().push(event);
    }

    /// Replace the stored chart configurations.
    pub fn set_charts(&self, charts: Vec<ChartConfiguration>) {
        *self.charts.lock() = charts;
    }

    /// Set failure mode for testing error handling.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    /// Times chart configurations were read.
    pub fn chart_loads(&self) -> usize {
        self.chart_loads.load(Ordering::SeqCst)
    }

    /// Times a partner history was requested.
    pub fn history_lookups(&self) -> usize {
        self.history_lookups.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if *self.should_fail.lock() {
            Err(Error::database("Mock store failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl EventStore for MockEventStore {
    async fn events(&self, query: &EventQuery) -> Result<Vec<EventRecord>> {
        self.check()?;
        let mut events: Vec<EventRecord> = self
            .events
            .lock()
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        newest_first(&mut events);
        if let Some(limit) = query.limit {
            events.truncate(limit);
        }
        Ok(events)
    }

    async fn event(&self, event_id: &str) -> Result<Option<EventRecord>> {
        self.check()?;
        Ok(self.events.lock().iter().find(|e| e.id == event_id).cloned())
    }

    async fn partner_history(
        &self,
        partner_id: &str,
        before: NaiveDate,
        limit: usize,
    ) -> Result<Vec<EventRecord>> {
        self.check()?;
        self.history_lookups.fetch_add(1, Ordering::SeqCst);
        let mut events: Vec<EventRecord> = self
            .events
            .lock()
            .iter()
            .filter(|e| e.date < before && e.involves(partner_id))
            .cloned()
            .collect();
        newest_first(&mut events);
        events.truncate(limit);
        Ok(events)
    }

    async fn chart_configurations(&self) -> Result<Vec<ChartConfiguration>> {
        self.check()?;
        self.chart_loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.charts.lock().clone())
    }

    async fn ping(&self) -> bool {
        !*self.should_fail.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{date, game};

    #[tokio::test]
    async fn test_mock_store_filters_and_orders() {
        let store = MockEventStore::new().with_events(vec![
            game("a", date(2024, 1, 1), "ftc", "mtk", 100.0),
            game("b", date(2024, 2, 1), "mtk", "ftc", 200.0),
            game("c", date(2024, 3, 1), "dvtk", "mtk", 300.0),
        ]);

        let events = store.events(&EventQuery::for_partner("ftc")).await.unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let history = store.partner_history("ftc", date(2024, 2, 1), 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(store.history_lookups(), 1);
    }

    #[tokio::test]
    async fn test_mock_store_failure_mode() {
        let store = MockEventStore::new();
        store.set_should_fail(true);

        let err = store.events(&EventQuery::all()).await.unwrap_err();
        assert_eq!(err.error_code(), "DB_001");
        assert!(!store.ping().await);
    }
}
