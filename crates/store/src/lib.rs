//! Storage for event statistics and chart configurations.
//!
//! Handlers talk to the [`EventStore`] trait; [`ClickHouseEventStore`] is the
//! production implementation.

pub mod client;
pub mod config;
pub mod health;
pub mod insert;
pub mod query;
pub mod rows;
pub mod schema;
pub mod source;

pub use client::*;
pub use config::*;
pub use query::ClickHouseEventStore;
pub use source::{EventQuery, EventStore};
