//! Recorded market analyses and their after-the-fact verification.
//!
//! An analysis is a recommendation (BUY, SELL or HOLD) made at a known
//! price, optionally with a target and a stop. Once enough time has passed
//! the verifier grades it against the price at that moment.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::symbol::Symbol;

/// Default band a HOLD call may drift within and still count as correct.
pub const DEFAULT_HOLD_TOLERANCE_PCT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl Recommendation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recommendation {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            "HOLD" => Ok(Self::Hold),
            _ => Err(DomainError::UnknownRecommendation {
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }

    const fn from_bool(ok: bool) -> Self {
        if ok {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

impl FromStr for Outcome {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            other => Err(DomainError::UnknownRecommendation {
                value: other.to_string(),
            }),
        }
    }
}

/// Analysis as submitted by a producer, before it gets an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnalysis {
    pub symbol: Symbol,
    #[serde(default)]
    pub agent_name: Option<String>,
    pub recommendation: Recommendation,
    pub confidence: f64,
    #[serde(default)]
    pub analysis: String,
    /// Price the recommendation was made at.
    pub entry_price: f64,
    #[serde(default)]
    pub target_price: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
}

impl NewAnalysis {
    /// Check confidence and price ranges.
    ///
    /// # Errors
    /// Returns a [`DomainError`] naming the first violated invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(DomainError::ConfidenceOutOfRange {
                confidence: self.confidence,
            });
        }
        if !self.entry_price.is_finite() || self.entry_price <= 0.0 {
            return Err(DomainError::NonPositivePrice {
                price: self.entry_price,
            });
        }
        for price in [self.target_price, self.stop_loss].into_iter().flatten() {
            if !price.is_finite() || price <= 0.0 {
                return Err(DomainError::NonPositivePrice { price });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub outcome: Outcome,
    pub price: f64,
    pub change_pct: f64,
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    pub symbol: Symbol,
    pub agent_name: Option<String>,
    pub recommendation: Recommendation,
    pub confidence: f64,
    pub analysis: String,
    pub entry_price: f64,
    pub target_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub verification: Option<Verification>,
}

impl AnalysisRecord {
    /// Grade this analysis against `price`.
    #[must_use]
    pub fn grade(&self, price: f64, hold_tolerance_pct: f64) -> Outcome {
        grade(
            self.recommendation,
            self.entry_price,
            price,
            self.target_price,
            self.stop_loss,
            hold_tolerance_pct,
        )
    }
}

/// Percent move from `from` to `to`.
#[must_use]
pub fn change_pct(from: f64, to: f64) -> f64 {
    if from == 0.0 {
        return 0.0;
    }
    (to - from) / from * 100.0
}

/// Decide whether a recommendation made at `entry` held up at `current`.
///
/// A reached target wins and a hit stop loses; otherwise BUY needs the
/// price to be above entry and SELL below it. HOLD is correct while the
/// absolute move stays within `hold_tolerance_pct`.
#[must_use]
pub fn grade(
    recommendation: Recommendation,
    entry: f64,
    current: f64,
    target: Option<f64>,
    stop: Option<f64>,
    hold_tolerance_pct: f64,
) -> Outcome {
    match recommendation {
        Recommendation::Buy => {
            if target.is_some_and(|t| current >= t) {
                Outcome::Success
            } else if stop.is_some_and(|s| current <= s) {
                Outcome::Failure
            } else {
                Outcome::from_bool(current > entry)
            }
        }
        Recommendation::Sell => {
            if target.is_some_and(|t| current <= t) {
                Outcome::Success
            } else if stop.is_some_and(|s| current >= s) {
                Outcome::Failure
            } else {
                Outcome::from_bool(current < entry)
            }
        }
        Recommendation::Hold => {
            Outcome::from_bool(change_pct(entry, current).abs() <= hold_tolerance_pct)
        }
    }
}
