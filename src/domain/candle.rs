//! OHLCV candles and ticker prices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::symbol::Symbol;

/// One OHLCV bar. The timestamp is the bar's open time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Build a candle, checking OHLCV consistency.
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidCandle`] when a value is non-finite or
    /// negative, or when high/low do not bracket open and close.
    pub fn try_new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, DomainError> {
        let candle = Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        };
        candle.validate()?;
        Ok(candle)
    }

    /// Check an already-deserialized candle.
    ///
    /// # Errors
    /// See [`Candle::try_new`].
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(invalid(format!("{name} is not finite")));
            }
            if value < 0.0 {
                return Err(invalid(format!("{name} is negative")));
            }
        }
        if self.high < self.open.max(self.close) {
            return Err(invalid("high is below open/close".to_string()));
        }
        if self.low > self.open.min(self.close) {
            return Err(invalid("low is above open/close".to_string()));
        }
        Ok(())
    }

    /// `(high + low + close) / 3`, the price CCI works on.
    #[must_use]
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

fn invalid(reason: String) -> DomainError {
    DomainError::InvalidCandle { reason }
}

/// Latest ticker reading for a pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    pub symbol: Symbol,
    pub price: f64,
    pub volume_24h: f64,
    pub change_24h: f64,
    pub timestamp: DateTime<Utc>,
}

impl PriceTick {
    /// Build a tick with a positive price.
    ///
    /// # Errors
    /// Returns [`DomainError::NonPositivePrice`] for zero, negative or
    /// non-finite prices.
    pub fn try_new(
        symbol: Symbol,
        price: f64,
        volume_24h: f64,
        change_24h: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if !price.is_finite() || price <= 0.0 {
            return Err(DomainError::NonPositivePrice { price });
        }
        Ok(Self {
            symbol,
            price,
            volume_24h,
            change_24h,
            timestamp,
        })
    }
}
