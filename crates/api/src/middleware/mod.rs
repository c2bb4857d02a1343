//! Request middleware.

pub mod latency;

pub use latency::track_latency;
