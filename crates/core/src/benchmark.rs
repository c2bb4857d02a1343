//! Benchmark distributions and composite scores.

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateRecord;
use crate::error::{Error, Result, ValidationErrorCode};
use crate::limits::MAX_BENCHMARK_METRICS;
use crate::stats::is_known_field;

/// Percentiles reported for every distribution.
pub const REPORTED_PERCENTILES: [f64; 6] = [10.0, 25.0, 50.0, 75.0, 90.0, 95.0];

/// Linearly interpolated percentile of an ascending slice.
///
/// `index = p/100 * (n - 1)`; a fractional index interpolates between the
/// floor and ceil elements. Returns `None` for an empty slice or `p` outside
/// `[0, 100]`.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }

    let index = (p / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = (index.ceil() as usize).min(sorted.len() - 1);
    let weight = index - lower as f64;

    if lower == upper || weight == 0.0 {
        Some(sorted[lower])
    } else {
        Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Share of samples at or below `value`, in percent.
pub fn percentile_rank(sorted: &[f64], value: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let at_or_below = sorted.partition_point(|v| *v <= value);
    Some(at_or_below as f64 / sorted.len() as f64 * 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p10: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

/// Distribution of one metric across records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkDistribution {
    pub metric: String,
    pub sample_count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub percentiles: Percentiles,
    #[serde(skip)]
    sorted: Vec<f64>,
}

impl BenchmarkDistribution {
    /// Build from unsorted samples; `None` when there are none.
    pub fn from_samples(metric: impl Into<String>, mut samples: Vec<f64>) -> Option<Self> {
        samples.retain(|v| v.is_finite());
        if samples.is_empty() {
            return None;
        }
        samples.sort_by(|a, b| a.total_cmp(b));

        let at = |p: f64| percentile(&samples, p).unwrap_or_default();
        let [p10, p25, p50, p75, p90, p95] = REPORTED_PERCENTILES.map(at);

        Some(Self {
            metric: metric.into(),
            sample_count: samples.len(),
            min: samples[0],
            max: samples[samples.len() - 1],
            mean: mean(&samples)?,
            std_dev: std_dev(&samples)?,
            percentiles: Percentiles {
                p10,
                p25,
                p50,
                p75,
                p90,
                p95,
            },
            sorted: samples,
        })
    }

    /// Percentile rank of `value` within this distribution.
    pub fn rank(&self, value: f64) -> f64 {
        percentile_rank(&self.sorted, value).unwrap_or_default()
    }
}

/// Validate the metric list of a benchmark request.
pub fn validate_metrics<S: AsRef<str>>(metrics: &[S]) -> Result<()> {
    if metrics.is_empty() {
        return Err(Error::validation(
            ValidationErrorCode::InvalidBenchmark,
            "at least one metric is required",
        ));
    }
    if metrics.len() > MAX_BENCHMARK_METRICS {
        return Err(Error::validation(
            ValidationErrorCode::InvalidBenchmark,
            format!("at most {} metrics per request", MAX_BENCHMARK_METRICS),
        ));
    }
    if let Some(unknown) = metrics.iter().find(|m| !is_known_field(m.as_ref())) {
        return Err(Error::validation(
            ValidationErrorCode::InvalidBenchmark,
            format!("unknown metric '{}'", unknown.as_ref()),
        ));
    }
    Ok(())
}

/// One distribution per metric that has at least one sample, in request order.
pub fn benchmark<S: AsRef<str>>(
    records: &[AggregateRecord],
    metrics: &[S],
) -> Vec<BenchmarkDistribution> {
    metrics
        .iter()
        .filter_map(|metric| {
            let metric = metric.as_ref();
            let samples = records.iter().filter_map(|r| r.stats.get(metric)).collect();
            BenchmarkDistribution::from_samples(metric, samples)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRank {
    pub metric: String,
    pub value: f64,
    pub percentile_rank: f64,
}

/// Mean percentile rank of one record across distributions, 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeScore {
    pub score: f64,
    pub metrics: Vec<MetricRank>,
}

/// Score `record` against the distributions.
///
/// Metrics the record lacks are skipped; `None` when none remain.
pub fn composite_score(
    record: &AggregateRecord,
    distributions: &[BenchmarkDistribution],
) -> Option<CompositeScore> {
    let metrics: Vec<MetricRank> = distributions
        .iter()
        .filter_map(|dist| {
            let value = record.stats.get(&dist.metric)?;
            Some(MetricRank {
                metric: dist.metric.clone(),
                value,
                percentile_rank: dist.rank(value),
            })
        })
        .collect();

    let ranks: Vec<f64> = metrics.iter().map(|m| m.percentile_rank).collect();
    let score = mean(&ranks)?;
    Some(CompositeScore { score, metrics })
}
