//! Request and evaluation limits.

/// Maximum number of hashtag terms in one filter.
pub const MAX_FILTER_TERMS: usize = 20;

/// Maximum length of a single tag or category (chars).
pub const MAX_TAG_LEN: usize = 100;

/// Preceding events considered by the insight rules.
pub const MAX_INSIGHT_HISTORY: usize = 10;

/// Events evaluated by one partner-insights request.
///
/// Each event costs one extra history lookup.
pub const MAX_INSIGHT_EVENTS: usize = 50;

/// Metrics accepted by one benchmark request.
pub const MAX_BENCHMARK_METRICS: usize = 25;

/// Formula source length (chars).
pub const MAX_FORMULA_LEN: usize = 500;

/// Chart title length (chars).
pub const MAX_CHART_TITLE_LEN: usize = 200;

/// Month a season starts in (August).
pub const SEASON_START_MONTH: u32 = 8;
