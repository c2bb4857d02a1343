//! Core types and calculations for the MessMass analytics engine.
//!
//! Everything here is pure: callers fetch events, this crate aggregates them,
//! evaluates charts, builds benchmark distributions, and derives insights.

pub mod aggregate;
pub mod benchmark;
pub mod chart;
pub mod comparison;
pub mod error;
pub mod event;
pub mod filter;
pub mod format;
pub mod formula;
pub mod insights;
pub mod limits;
pub mod stats;

pub use aggregate::{aggregate, aggregate_matching, AggregateRecord, DateRange};
pub use benchmark::{benchmark, composite_score, percentile, BenchmarkDistribution, CompositeScore};
pub use chart::{
    calculate_chart, calculate_charts, compile_active, ChartCalculationResult, ChartConfiguration,
    ChartDefinition, ChartType, CompiledCharts, ElementConfig, ElementValue,
};
pub use comparison::{compare_partner, PartnerComparison};
pub use error::{Error, Result, ValidationErrorCode};
pub use event::{EventRecord, Venue};
pub use filter::{DateWindow, EventPredicate, FilterTerm, HashtagFilter, MatchMode};
pub use formula::{Evaluated, Formula};
pub use insights::{
    default_rules, evaluate_batch, evaluate_event, Finding, Insight, InsightReport, InsightRule,
    Priority,
};
pub use stats::StatRecord;
