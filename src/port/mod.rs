//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to plug storage into the
//! application services.
//!
//! # Architecture
//!
//! ```text
//!                    ┌─────────────────────────┐
//!     HTTP / CLI ───▶│      Application        │
//!                    │  Domain + Port          │
//!                    └────────────┬────────────┘
//!                                 │
//!                                 ▼
//!                    ┌─────────────────────────┐
//!                    │  Store adapters         │
//!                    │  (SQLite, in-memory)    │
//!                    └─────────────────────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`MarketStore`] - Candles, ticker prices and indicator snapshots
//! - [`AnalysisStore`] - Recorded analyses and their verification

pub mod outbound;

pub use outbound::store::{AnalysisStore, MarketStore, StoredSnapshot};
