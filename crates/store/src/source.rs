//! The storage seam used by the API handlers.

use analytics_core::{ChartConfiguration, DateWindow, EventPredicate, EventRecord, Result};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Which events to load. Hashtag terms are matched in memory after loading,
/// so only the partner and date bounds are pushed down to storage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventQuery {
    /// Events where this partner played home or away.
    pub partner_id: Option<String>,
    pub window: DateWindow,
    pub limit: Option<usize>,
}

impl EventQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_partner(partner_id: impl Into<String>) -> Self {
        Self {
            partner_id: Some(partner_id.into()),
            ..Self::default()
        }
    }

    /// The storage-side part of an aggregation predicate.
    pub fn for_predicate(predicate: &EventPredicate) -> Self {
        Self {
            partner_id: predicate.partner_id.clone(),
            window: predicate.window,
            limit: None,
        }
    }

    pub fn within(mut self, window: DateWindow) -> Self {
        self.window = window;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `event` satisfies the partner and window bounds.
    pub fn matches(&self, event: &EventRecord) -> bool {
        self.window.contains(event.date)
            && self
                .partner_id
                .as_deref()
                .map_or(true, |partner| event.involves(partner))
    }
}

/// Read access to events and chart configurations.
///
/// Implementations return events newest first (date descending, then id).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Events matching the query.
    async fn events(&self, query: &EventQuery) -> Result<Vec<EventRecord>>;

    /// One event by id.
    async fn event(&self, event_id: &str) -> Result<Option<EventRecord>>;

    /// Up to `limit` events of `partner_id` dated strictly before `before`.
    async fn partner_history(
        &self,
        partner_id: &str,
        before: NaiveDate,
        limit: usize,
    ) -> Result<Vec<EventRecord>>;

    /// Every stored chart configuration, active or not.
    async fn chart_configurations(&self) -> Result<Vec<ChartConfiguration>>;

    /// Whether storage is reachable.
    async fn ping(&self) -> bool;
}

/// Newest-first ordering shared by every implementation.
pub fn newest_first(events: &mut [EventRecord]) {
    events.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
}
