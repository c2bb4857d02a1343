//! Logging, in-process metrics, and component health for the analytics service.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
