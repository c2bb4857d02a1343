//! HTTP API for the MessMass analytics engine.

pub mod extractors;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{AppState, ChartCache, ChartsConfig, InsightsConfig};
