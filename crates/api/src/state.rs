//! Application state shared across handlers.

use analytics_core::{
    compile_active, default_rules, limits::MAX_INSIGHT_EVENTS, CompiledCharts, InsightRule, Result,
};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use stats_store::EventStore;
use std::sync::Arc;
use std::time::Duration;
use telemetry::metrics;
use tracing::{debug, info, warn};

/// Chart configuration cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_capacity() -> u64 {
    16
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

/// Insight endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    /// Events evaluated per partner request; capped at 50.
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

fn default_max_events() -> usize {
    MAX_INSIGHT_EVENTS
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
        }
    }
}

const ACTIVE_CHARTS: &str = "active";

/// Compiled active chart definitions, refreshed from storage after the TTL.
#[derive(Clone)]
pub struct ChartCache {
    cache: Cache<&'static str, Arc<CompiledCharts>>,
}

impl ChartCache {
    pub fn new(config: &ChartsConfig) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(config.cache_capacity.max(1))
                .time_to_live(Duration::from_secs(config.cache_ttl_secs))
                .build(),
        }
    }

    /// Compiled active charts, loading and compiling them on a miss.
    pub async fn active(&self, store: &dyn EventStore) -> Result<Arc<CompiledCharts>> {
        if let Some(cached) = self.cache.get(ACTIVE_CHARTS).await {
            debug!("Chart cache hit");
            return Ok(cached);
        }

        let configs = store.chart_configurations().await?;
        let compiled = Arc::new(compile_active(&configs));
        for (chart_id, err) in &compiled.rejected {
            warn!(chart_id = %chart_id, error = %err, "Skipping invalid chart configuration");
        }
        metrics().charts_rejected.inc_by(compiled.rejected.len() as u64);
        info!(
            loaded = configs.len(),
            active = compiled.charts.len(),
            rejected = compiled.rejected.len(),
            "Compiled chart configurations"
        );

        self.cache.insert(ACTIVE_CHARTS, compiled.clone()).await;
        Ok(compiled)
    }

    /// Drop the cached definitions so the next request reloads them.
    pub async fn invalidate(&self) {
        self.cache.invalidate(ACTIVE_CHARTS).await;
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Event and chart storage (ClickHouse in production, mock in tests)
    pub store: Arc<dyn EventStore>,
    pub charts: ChartCache,
    pub rules: Arc<Vec<Box<dyn InsightRule>>>,
    pub insights: InsightsConfig,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self::with_config(store, &ChartsConfig::default(), InsightsConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn EventStore>,
        charts: &ChartsConfig,
        insights: InsightsConfig,
    ) -> Self {
        Self {
            store,
            charts: ChartCache::new(charts),
            rules: Arc::new(default_rules()),
            insights,
        }
    }

    /// Events per partner insight request, never above the hard cap.
    pub fn max_insight_events(&self) -> usize {
        self.insights.max_events.clamp(1, MAX_INSIGHT_EVENTS)
    }
}
