//! Domain validation errors for core domain types.
//!
//! This module defines errors that occur when domain invariants are violated.
//! These errors are returned by `try_new` constructors and parsers that
//! validate inputs arriving from the ingest API or the database.
//!
//! # Examples
//!
//! ```
//! use solbot::domain::error::DomainError;
//! use solbot::domain::timeframe::Timeframe;
//!
//! let result = "3m".parse::<Timeframe>();
//! assert!(matches!(result, Err(DomainError::UnknownTimeframe { .. })));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Symbols must contain a base asset.
    #[error("symbol cannot be empty")]
    EmptySymbol,

    /// Symbols may only contain ASCII alphanumerics around the separator.
    #[error("invalid symbol '{symbol}'")]
    InvalidSymbol {
        /// The rejected input.
        symbol: String,
    },

    /// Only the supported candle intervals are accepted.
    #[error("unknown timeframe '{value}' (expected one of 5m, 15m, 1h, 4h)")]
    UnknownTimeframe {
        /// The rejected input.
        value: String,
    },

    /// OHLCV values must be finite, non-negative and internally consistent.
    #[error("invalid candle: {reason}")]
    InvalidCandle {
        /// What was wrong with the candle.
        reason: String,
    },

    /// Ticker prices must be positive.
    #[error("price must be positive, got {price}")]
    NonPositivePrice {
        /// The invalid price that was provided.
        price: f64,
    },

    /// Analyses carry a BUY, SELL or HOLD recommendation.
    #[error("unknown recommendation '{value}'")]
    UnknownRecommendation {
        /// The rejected input.
        value: String,
    },

    /// Confidence is a probability.
    #[error("confidence must be within [0, 1], got {confidence}")]
    ConfidenceOutOfRange {
        /// The rejected confidence.
        confidence: f64,
    },

    /// Minute-of-hour schedules need at least one valid slot.
    #[error("invalid schedule: {reason}")]
    InvalidSchedule {
        /// What was wrong with the schedule.
        reason: String,
    },
}
