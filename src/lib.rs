//! solbot - multi-symbol crypto market analysis service.
//!
//! Candles and ticker prices are pushed in over HTTP, stored in SQLite and
//! turned into technical indicators, multi-timeframe views and trading
//! signals. A clock-synchronized scheduler refreshes indicators, runs
//! signal detection and grades recorded analyses against later prices.
//!
//! # Modules
//!
//! - [`domain`] - Symbols, timeframes, candles, indicators, signals, analyses
//! - [`port`] - Storage traits the application depends on
//! - [`application`] - Indicator math, market data, signal and verification services
//! - [`adapter`] - SQLite and in-memory stores, the HTTP API and the CLI
//! - [`infrastructure`] - Configuration, logging, wiring, scheduler and health
//! - [`error`] - Error types for the crate
//!
//! # Example
//!
//! ```no_run
//! use solbot::infrastructure::bootstrap::Services;
//! use solbot::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     let services = Services::open(config)?;
//!     println!("healthy: {}", services.health().is_healthy());
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
