//! In-process metrics.
//!
//! Plain atomics behind a global registry; `snapshot()` is what the health
//! endpoint reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Returns bucket counts.
    pub fn buckets(&self) -> Vec<(u64, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .zip(self.buckets.iter())
            .map(|(&bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Counters for the calculation pipeline and its storage calls.
#[derive(Debug, Default)]
pub struct Metrics {
    // Calculation
    pub aggregations_run: Counter,
    pub events_aggregated: Counter,
    pub charts_calculated: Counter,
    pub charts_rejected: Counter,
    pub benchmarks_run: Counter,
    pub comparisons_run: Counter,

    // Insights
    pub insights_generated: Counter,
    pub insight_rule_failures: Counter,
    pub insight_events_skipped: Counter,

    // Storage
    pub store_queries: Counter,
    pub store_errors: Counter,
    pub rows_skipped: Counter,

    // Latency histograms
    pub request_latency_ms: Histogram,
    pub store_latency_ms: Histogram,

    // Gauges
    pub requests_in_flight: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub aggregations_run: u64,
    pub events_aggregated: u64,
    pub charts_calculated: u64,
    pub charts_rejected: u64,
    pub benchmarks_run: u64,
    pub comparisons_run: u64,
    pub insights_generated: u64,
    pub insight_rule_failures: u64,
    pub insight_events_skipped: u64,
    pub store_queries: u64,
    pub store_errors: u64,
    pub rows_skipped: u64,
    pub request_latency_mean_ms: f64,
    pub store_latency_mean_ms: f64,
    pub requests_in_flight: u64,
}

impl Metrics {
    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            aggregations_run: self.aggregations_run.get(),
            events_aggregated: self.events_aggregated.get(),
            charts_calculated: self.charts_calculated.get(),
            charts_rejected: self.charts_rejected.get(),
            benchmarks_run: self.benchmarks_run.get(),
            comparisons_run: self.comparisons_run.get(),
            insights_generated: self.insights_generated.get(),
            insight_rule_failures: self.insight_rule_failures.get(),
            insight_events_skipped: self.insight_events_skipped.get(),
            store_queries: self.store_queries.get(),
            store_errors: self.store_errors.get(),
            rows_skipped: self.rows_skipped.get(),
            request_latency_mean_ms: self.request_latency_ms.mean(),
            store_latency_mean_ms: self.store_latency_ms.mean(),
            requests_in_flight: self.requests_in_flight.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
