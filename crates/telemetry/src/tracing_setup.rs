//! Tracing setup for structured logging.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

/// Default filter when neither `RUST_LOG` nor a configured filter parses.
pub const DEFAULT_FILTER: &str = "info,tower_http=info";

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level filter (e.g., "info", "api=debug")
    pub filter: String,
    /// Whether to output JSON format
    pub json: bool,
    /// Whether to include span open/close events
    pub span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            json: false,
            span_events: false,
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

impl TracingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `RUST_LOG`, `LOG_JSON` and `LOG_SPANS`.
    pub fn from_env() -> Self {
        Self {
            filter: std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string()),
            json: env_flag("LOG_JSON"),
            span_events: env_flag("LOG_SPANS"),
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    pub fn with_span_events(mut self, span_events: bool) -> Self {
        self.span_events = span_events;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }

    fn fmt_span(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Install the global subscriber. Fails if one is already set.
pub fn try_init_tracing(config: &TracingConfig) -> Result<(), TryInitError> {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    if config.json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(config.fmt_span())
                    .with_target(true)
                    .with_current_span(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_span_events(config.fmt_span())
                    .with_target(true),
            )
            .try_init()
    }
}

/// Initialize tracing; a second call is a no-op.
pub fn init_tracing(config: TracingConfig) {
    match try_init_tracing(&config) {
        Ok(()) => tracing::info!(
            filter = %config.filter,
            json = config.json,
            "Tracing initialized"
        ),
        Err(_) => tracing::debug!("Tracing already initialized"),
    }
}

/// Initialize tracing from environment variables.
pub fn init_tracing_from_env() {
    init_tracing(TracingConfig::from_env());
}
