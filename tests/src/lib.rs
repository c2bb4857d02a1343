//! Shared helpers for the HTTP-level tests.
//!
//! Every test builds the production router over [`mocks::MockEventStore`],
//! so no database is needed.

pub mod fixtures;
pub mod mocks;
pub mod setup;
