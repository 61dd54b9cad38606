//! Technical indicator values and their qualitative readings.

use serde::{Deserialize, Serialize};

/// Latest value of each tracked indicator. `None` means not enough history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub rsi_14: Option<f64>,
    pub ma_20: Option<f64>,
    pub ma_50: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub cci_20: Option<f64>,
}

impl IndicatorSnapshot {
    /// True when no indicator could be computed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Indicator history, right-aligned so the last entry matches the most
/// recent candle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub rsi_14: Vec<Option<f64>>,
    pub ma_20: Vec<Option<f64>>,
    pub ma_50: Vec<Option<f64>>,
    pub macd: Vec<Option<f64>>,
    pub macd_signal: Vec<Option<f64>>,
    pub macd_histogram: Vec<Option<f64>>,
    pub bb_upper: Vec<Option<f64>>,
    pub bb_middle: Vec<Option<f64>>,
    pub bb_lower: Vec<Option<f64>>,
    pub cci_20: Vec<Option<f64>>,
}

impl IndicatorSeries {
    /// Last non-null value of every column.
    #[must_use]
    pub fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi_14: last_value(&self.rsi_14),
            ma_20: last_value(&self.ma_20),
            ma_50: last_value(&self.ma_50),
            macd: last_value(&self.macd),
            macd_signal: last_value(&self.macd_signal),
            bb_upper: last_value(&self.bb_upper),
            bb_middle: last_value(&self.bb_middle),
            bb_lower: last_value(&self.bb_lower),
            cci_20: last_value(&self.cci_20),
        }
    }
}

/// Last non-null entry of a series.
#[must_use]
pub fn last_value(series: &[Option<f64>]) -> Option<f64> {
    series.iter().rev().find_map(|v| *v)
}

/// Oscillator zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    Overbought,
    Oversold,
    Neutral,
}

impl Zone {
    const fn weight(self) -> i32 {
        match self {
            Self::Oversold => 1,
            Self::Overbought => -1,
            Self::Neutral => 0,
        }
    }
}

/// Trend direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trend {
    Bullish,
    Bearish,
}

impl Trend {
    const fn weight(self) -> i32 {
        match self {
            Self::Bullish => 1,
            Self::Bearish => -1,
        }
    }
}

/// Combined stance across all readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stance {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

/// Per-indicator labels for the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Readings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<Zone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<Trend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger: Option<Zone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cci: Option<Zone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ma_trend: Option<Trend>,
    pub overall: Stance,
}

impl Readings {
    /// Label the snapshot against the latest close.
    #[must_use]
    pub fn from_snapshot(snapshot: &IndicatorSnapshot, price: f64) -> Self {
        let rsi = snapshot.rsi_14.map(|rsi| {
            if rsi > 70.0 {
                Zone::Overbought
            } else if rsi < 30.0 {
                Zone::Oversold
            } else {
                Zone::Neutral
            }
        });

        let macd = match (snapshot.macd, snapshot.macd_signal) {
            (Some(macd), Some(signal)) if macd > signal => Some(Trend::Bullish),
            (Some(_), Some(_)) => Some(Trend::Bearish),
            _ => None,
        };

        let bollinger = match (snapshot.bb_upper, snapshot.bb_middle, snapshot.bb_lower) {
            (Some(upper), Some(_), Some(lower)) => Some(if price > upper {
                Zone::Overbought
            } else if price < lower {
                Zone::Oversold
            } else {
                Zone::Neutral
            }),
            _ => None,
        };

        let cci = snapshot.cci_20.map(|cci| {
            if cci > 100.0 {
                Zone::Overbought
            } else if cci < -100.0 {
                Zone::Oversold
            } else {
                Zone::Neutral
            }
        });

        let ma_trend = match (snapshot.ma_20, snapshot.ma_50) {
            (Some(fast), Some(slow)) if fast > slow => Some(Trend::Bullish),
            (Some(_), Some(_)) => Some(Trend::Bearish),
            _ => None,
        };

        let mut readings = Self {
            rsi,
            macd,
            bollinger,
            cci,
            ma_trend,
            overall: Stance::Hold,
        };
        readings.overall = readings.stance();
        readings
    }

    fn stance(&self) -> Stance {
        let weights = [
            self.rsi.map(Zone::weight),
            self.macd.map(Trend::weight),
            self.bollinger.map(Zone::weight),
            self.cci.map(Zone::weight),
            self.ma_trend.map(Trend::weight),
        ];
        let count = weights.iter().flatten().count();
        let score: i32 = weights.iter().flatten().sum();

        if count == 0 {
            return Stance::Hold;
        }
        if count < 3 {
            return match score {
                s if s >= 2 => Stance::Buy,
                s if s <= -2 => Stance::Sell,
                _ => Stance::Hold,
            };
        }
        match score {
            s if s >= 3 => Stance::StrongBuy,
            s if s >= 1 => Stance::Buy,
            s if s <= -3 => Stance::StrongSell,
            s if s <= -1 => Stance::Sell,
            _ => Stance::Hold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_holds() {
        let readings = Readings::from_snapshot(&IndicatorSnapshot::default(), 100.0);
        assert_eq!(readings.overall, Stance::Hold);
        assert!(readings.rsi.is_none());
    }

    #[test]
    fn all_bullish_is_strong_buy() {
        let snapshot = IndicatorSnapshot {
            rsi_14: Some(25.0),
            ma_20: Some(105.0),
            ma_50: Some(100.0),
            macd: Some(1.0),
            macd_signal: Some(0.5),
            bb_upper: Some(110.0),
            bb_middle: Some(100.0),
            bb_lower: Some(95.0),
            cci_20: Some(-150.0),
        };
        let readings = Readings::from_snapshot(&snapshot, 90.0);
        assert_eq!(readings.rsi, Some(Zone::Oversold));
        assert_eq!(readings.bollinger, Some(Zone::Oversold));
        assert_eq!(readings.overall, Stance::StrongBuy);
    }

    #[test]
    fn few_readings_need_two_points() {
        let snapshot = IndicatorSnapshot {
            macd: Some(1.0),
            macd_signal: Some(2.0),
            ..Default::default()
        };
        let readings = Readings::from_snapshot(&snapshot, 100.0);
        assert_eq!(readings.macd, Some(Trend::Bearish));
        assert_eq!(readings.overall, Stance::Hold);
    }

    #[test]
    fn mixed_readings_lean_sell() {
        let snapshot = IndicatorSnapshot {
            rsi_14: Some(75.0),
            ma_20: Some(99.0),
            ma_50: Some(100.0),
            macd: Some(1.0),
            macd_signal: Some(0.5),
            ..Default::default()
        };
        let readings = Readings::from_snapshot(&snapshot, 100.0);
        assert_eq!(readings.overall, Stance::Sell);
    }

    #[test]
    fn series_snapshot_skips_trailing_gaps() {
        let series = IndicatorSeries {
            rsi_14: vec![None, Some(40.0), Some(42.0), None],
            ..Default::default()
        };
        assert_eq!(series.snapshot().rsi_14, Some(42.0));
        assert_eq!(series.snapshot().ma_20, None);
    }
}
