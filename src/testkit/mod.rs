//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Builders for candles, ticks and analyses.
//! - [`config`] - Canonical test configurations and in-memory services.

pub mod config;
pub mod domain;
