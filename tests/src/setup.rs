//! Common test setup functions.

use analytics_core::{ChartConfiguration, EventRecord};
use api::{router, AppState, ChartsConfig, InsightsConfig};
use axum::Router;
use axum_test::TestServer;
use stats_store::EventStore;
use std::sync::Arc;

use crate::mocks::MockEventStore;

/// Test context wiring the real router to an in-memory store.
pub struct TestContext {
    pub store: Arc<MockEventStore>,
    pub router: Router,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_store(MockEventStore::new())
    }

    pub fn with_data(events: Vec<EventRecord>, charts: Vec<ChartConfiguration>) -> Self {
        Self::with_store(MockEventStore::new().with_events(events).with_charts(charts))
    }

    pub fn with_store(store: MockEventStore) -> Self {
        Self::with_config(store, &ChartsConfig::default(), InsightsConfig::default())
    }

    pub fn with_config(
        store: MockEventStore,
        charts: &ChartsConfig,
        insights: InsightsConfig,
    ) -> Self {
        let store = Arc::new(store);
        let state = AppState::with_config(store.clone() as Arc<dyn EventStore>, charts, insights);
        Self {
            store,
            router: router(state),
        }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router.clone()).expect("Failed to create test server")
    }

    /// Set the mock store to fail (for error testing).
    pub fn set_store_failure(&self, should_fail: bool) {
        self.store.set_should_fail(should_fail);
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
