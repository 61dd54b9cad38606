//! Builders for domain primitives used across tests.
//!
//! Candle series are spaced five minutes apart starting at [`base_time`],
//! each bar opening at the previous close with volume 1000.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::domain::{Candle, NewAnalysis, PriceTick, Recommendation, Symbol};

const SPACING_MINUTES: i64 = 5;
const VOLUME: f64 = 1_000.0;

/// Fixed, minute-aligned origin for generated series.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0)
        .single()
        .expect("valid base time")
}

/// Candles closing at each of `closes`.
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    let mut out = Vec::with_capacity(closes.len());
    let mut open = closes.first().copied().unwrap_or_default();
    for (i, &close) in closes.iter().enumerate() {
        out.push(bar(i, open, close, VOLUME));
        open = close;
    }
    out
}

/// `n` candles whose close rises by `step` each bar from `start`.
pub fn trending_candles(n: usize, start: f64, step: f64) -> Vec<Candle> {
    let closes: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
    candles_from_closes(&closes)
}

/// `n - 1` flat candles at `base` followed by a bar closing `jump_pct`
/// percent higher on triple volume.
pub fn surge_candles(n: usize, base: f64, jump_pct: f64) -> Vec<Candle> {
    let mut candles = candles_from_closes(&vec![base; n.saturating_sub(1)]);
    let close = base * (1.0 + jump_pct / 100.0);
    candles.push(bar(candles.len(), base, close, VOLUME * 3.0));
    candles
}

/// Ticker at `base_time`.
pub fn price_tick(symbol: &Symbol, price: f64) -> PriceTick {
    PriceTick::try_new(symbol.clone(), price, 0.0, 0.0, base_time()).expect("positive price")
}

/// Minimal valid analysis for `symbol`.
pub fn analysis(symbol: &Symbol, recommendation: Recommendation, entry_price: f64) -> NewAnalysis {
    NewAnalysis {
        symbol: symbol.clone(),
        agent_name: Some("tester".to_string()),
        recommendation,
        confidence: 0.7,
        analysis: "generated".to_string(),
        entry_price,
        target_price: None,
        stop_loss: None,
    }
}

fn bar(index: usize, open: f64, close: f64, volume: f64) -> Candle {
    Candle {
        timestamp: base_time() + Duration::minutes(SPACING_MINUTES * index as i64),
        open,
        high: open.max(close) * 1.001,
        low: open.min(close) * 0.999,
        close,
        volume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_candles_are_valid_and_ordered() {
        let candles = trending_candles(10, 50.0, -1.0);
        assert!(candles.iter().all(|c| c.validate().is_ok()));
        assert!(candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(candles[1].open, candles[0].close);
    }

    #[test]
    fn surge_ends_high() {
        let candles = surge_candles(30, 100.0, 6.0);
        let last = candles.last().unwrap();
        assert_eq!(candles.len(), 30);
        assert!((last.close - 106.0).abs() < 1e-9);
        assert!(last.high >= last.close);
        assert!(last.validate().is_ok());
    }
}
