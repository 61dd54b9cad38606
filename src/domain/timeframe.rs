//! Candle intervals.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::DomainError;

/// Supported candle intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    M5,
    M15,
    H1,
    H4,
}

impl Timeframe {
    /// Every supported interval, shortest first.
    pub const ALL: [Timeframe; 4] = [Self::M5, Self::M15, Self::H1, Self::H4];

    /// Intervals the scheduler keeps fresh.
    pub const COLLECTED: [Timeframe; 3] = [Self::M5, Self::M15, Self::H1];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::H1 => "1h",
            Self::H4 => "4h",
        }
    }

    #[must_use]
    pub const fn minutes(self) -> i64 {
        match self {
            Self::M5 => 5,
            Self::M15 => 15,
            Self::H1 => 60,
            Self::H4 => 240,
        }
    }

    #[must_use]
    pub fn duration(self) -> Duration {
        Duration::minutes(self.minutes())
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "5m" => Ok(Self::M5),
            "15m" => Ok(Self::M15),
            "1h" | "60m" => Ok(Self::H1),
            "4h" | "240m" => Ok(Self::H4),
            _ => Err(DomainError::UnknownTimeframe {
                value: s.to_string(),
            }),
        }
    }
}

impl Serialize for Timeframe {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Timeframe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse a comma-separated timeframe list such as `5m,15m,1h`.
///
/// # Errors
/// Returns the first unknown interval.
pub fn parse_list(raw: &str) -> Result<Vec<Timeframe>, DomainError> {
    let mut out = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let tf: Timeframe = part.parse()?;
        if !out.contains(&tf) {
            out.push(tf);
        }
    }
    Ok(out)
}
