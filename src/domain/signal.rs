//! Indicator-derived market signals.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::symbol::Symbol;

/// What triggered a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    GoldenCross,
    DeadCross,
    MacdBullishCross,
    MacdBearishCross,
    RsiOversoldReversal,
    RsiOverboughtReversal,
    BbUpwardBreakout,
    BbDownwardBreakout,
    VolumePriceSurgeUp,
    VolumePriceSurgeDown,
    CciOversoldReversal,
    CciOverboughtReversal,
    MultiIndicatorBullish,
    MultiIndicatorBearish,
}

impl SignalKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GoldenCross => "GOLDEN_CROSS",
            Self::DeadCross => "DEAD_CROSS",
            Self::MacdBullishCross => "MACD_BULLISH_CROSS",
            Self::MacdBearishCross => "MACD_BEARISH_CROSS",
            Self::RsiOversoldReversal => "RSI_OVERSOLD_REVERSAL",
            Self::RsiOverboughtReversal => "RSI_OVERBOUGHT_REVERSAL",
            Self::BbUpwardBreakout => "BB_UPWARD_BREAKOUT",
            Self::BbDownwardBreakout => "BB_DOWNWARD_BREAKOUT",
            Self::VolumePriceSurgeUp => "VOLUME_PRICE_SURGE_UP",
            Self::VolumePriceSurgeDown => "VOLUME_PRICE_SURGE_DOWN",
            Self::CciOversoldReversal => "CCI_OVERSOLD_REVERSAL",
            Self::CciOverboughtReversal => "CCI_OVERBOUGHT_REVERSAL",
            Self::MultiIndicatorBullish => "MULTI_INDICATOR_BULLISH",
            Self::MultiIndicatorBearish => "MULTI_INDICATOR_BEARISH",
        }
    }
}

/// Signal strength, ordered weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strength {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Strength {
    #[must_use]
    pub const fn score(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::VeryHigh => 4,
        }
    }
}

/// Side a signal points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: Symbol,
    #[serde(rename = "type")]
    pub kind: SignalKind,
    pub strength: Strength,
    pub direction: Direction,
    pub value: f64,
    pub description: String,
    pub priority: u8,
}

impl Signal {
    /// Strength score weighted by priority.
    #[must_use]
    pub fn priority_score(&self) -> u32 {
        u32::from(self.strength.score()) * u32::from(self.priority)
    }
}

/// Aggregate view over a detection round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSummary {
    pub total_signals: usize,
    pub symbols_with_signals: usize,
    pub signal_types: BTreeMap<SignalKind, usize>,
    pub high_priority_signals: usize,
    pub very_high_strength_signals: usize,
    pub timestamp: DateTime<Utc>,
}

impl SignalSummary {
    #[must_use]
    pub fn from_signals(all: &BTreeMap<Symbol, Vec<Signal>>, timestamp: DateTime<Utc>) -> Self {
        let mut signal_types = BTreeMap::new();
        let mut high_priority_signals = 0;
        let mut very_high_strength_signals = 0;

        for signal in all.values().flatten() {
            *signal_types.entry(signal.kind).or_insert(0) += 1;
            if signal.priority >= 3 {
                high_priority_signals += 1;
            }
            if signal.strength == Strength::VeryHigh {
                very_high_strength_signals += 1;
            }
        }

        Self {
            total_signals: all.values().map(Vec::len).sum(),
            symbols_with_signals: all.len(),
            signal_types,
            high_priority_signals,
            very_high_strength_signals,
            timestamp,
        }
    }
}

/// One-line digest of a symbol's signals: strength buckets and the
/// buy/sell balance.
#[must_use]
pub fn describe(signals: &[Signal]) -> String {
    if signals.is_empty() {
        return "no signals".to_string();
    }

    let names = |strength: Strength| -> Vec<&'static str> {
        signals
            .iter()
            .filter(|s| s.strength == strength)
            .map(|s| s.kind.as_str())
            .collect()
    };

    let mut parts = Vec::new();
    for (label, strength) in [
        ("very strong", Strength::VeryHigh),
        ("strong", Strength::High),
        ("moderate", Strength::Medium),
    ] {
        let kinds = names(strength);
        if !kinds.is_empty() {
            parts.push(format!("{label}: {}", kinds.join(", ")));
        }
    }

    let buys = signals.iter().filter(|s| s.direction == Direction::Buy).count();
    let sells = signals.len() - buys;
    let bias = match buys.cmp(&sells) {
        std::cmp::Ordering::Greater => format!("bullish bias ({buys} vs {sells})"),
        std::cmp::Ordering::Less => format!("bearish bias ({sells} vs {buys})"),
        std::cmp::Ordering::Equal => "neutral".to_string(),
    };
    parts.push(format!("direction: {bias}"));
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(kind: SignalKind, strength: Strength, direction: Direction, priority: u8) -> Signal {
        Signal {
            symbol: Symbol::default_symbol(),
            kind,
            strength,
            direction,
            value: 1.0,
            description: String::new(),
            priority,
        }
    }

    #[test]
    fn strength_orders_weakest_first() {
        assert!(Strength::VeryHigh > Strength::High);
        assert!(Strength::Medium > Strength::Low);
        assert_eq!(Strength::VeryHigh.score(), 4);
    }

    #[test]
    fn serializes_kind_as_type() {
        let s = signal(SignalKind::GoldenCross, Strength::High, Direction::Buy, 3);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["type"], "GOLDEN_CROSS");
        assert_eq!(json["strength"], "HIGH");
        assert_eq!(json["direction"], "BUY");
    }

    #[test]
    fn summary_counts_priorities() {
        let mut all = BTreeMap::new();
        all.insert(
            Symbol::default_symbol(),
            vec![
                signal(SignalKind::GoldenCross, Strength::VeryHigh, Direction::Buy, 4),
                signal(SignalKind::MacdBullishCross, Strength::Medium, Direction::Buy, 2),
            ],
        );
        let summary = SignalSummary::from_signals(&all, Utc::now());
        assert_eq!(summary.total_signals, 2);
        assert_eq!(summary.symbols_with_signals, 1);
        assert_eq!(summary.high_priority_signals, 1);
        assert_eq!(summary.very_high_strength_signals, 1);
        assert_eq!(summary.signal_types[&SignalKind::GoldenCross], 1);
    }

    #[test]
    fn describe_reports_bias() {
        let signals = vec![
            signal(SignalKind::DeadCross, Strength::High, Direction::Sell, 3),
            signal(SignalKind::MacdBearishCross, Strength::Medium, Direction::Sell, 2),
            signal(SignalKind::RsiOversoldReversal, Strength::High, Direction::Buy, 3),
        ];
        let text = describe(&signals);
        assert!(text.contains("strong: DEAD_CROSS, RSI_OVERSOLD_REVERSAL"));
        assert!(text.contains("moderate: MACD_BEARISH_CROSS"));
        assert!(text.ends_with("direction: bearish bias (2 vs 1)"));
    }
}
