//! Indicator-driven signal detection.
//!
//! Detection looks for *changes* (crosses, reversals, breakouts) rather than
//! static threshold levels, so a market sitting in an oversold zone does not
//! fire on every round. Each symbol is analysed at most once per cooldown
//! window.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::application::indicator;
use crate::domain::indicator::{IndicatorSeries, IndicatorSnapshot};
use crate::domain::{Candle, Direction, Signal, SignalKind, Strength, Symbol, Timeframe};
use crate::error::{Error, Result};
use crate::port::MarketStore;

/// Candles loaded per detection round.
pub const LOOKBACK_CANDLES: usize = 200;

/// Fewer candles than this and detection is skipped.
pub const MIN_CANDLES: usize = 100;

/// Indicator history kept for cross and reversal checks.
pub const ANALYSIS_PERIODS: usize = 100;

/// Signals returned per symbol and round.
pub const MAX_SIGNALS: usize = 3;

/// Outcome of a detection round across several symbols.
#[derive(Debug, Default)]
pub struct Detections {
    /// Symbols with at least one signal.
    pub signals: BTreeMap<Symbol, Vec<Signal>>,
    pub failures: Vec<(Symbol, Error)>,
}

/// Detects signals for symbols and enforces the per-symbol cooldown.
pub struct SignalDetector {
    store: Arc<dyn MarketStore>,
    cooldown: Duration,
    last_detection: DashMap<Symbol, DateTime<Utc>>,
}

impl SignalDetector {
    #[must_use]
    pub fn new(store: Arc<dyn MarketStore>, cooldown: Duration) -> Self {
        Self {
            store,
            cooldown,
            last_detection: DashMap::new(),
        }
    }

    /// Run detection for `symbol` as of now.
    ///
    /// # Errors
    /// Returns an error if candles cannot be loaded.
    pub fn detect(&self, symbol: &Symbol, timeframe: Timeframe) -> Result<Vec<Signal>> {
        self.detect_at(symbol, timeframe, Utc::now())
    }

    /// Run detection as of `now`, honouring and arming the cooldown.
    ///
    /// The cooldown is armed whenever any raw signal fires, even if all of
    /// them are filtered out as too weak.
    ///
    /// # Errors
    /// Returns an error if candles cannot be loaded.
    pub fn detect_at(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Result<Vec<Signal>> {
        if let Some(remaining) = self.cooldown_remaining(symbol, now) {
            debug!(
                symbol = %symbol,
                remaining_minutes = remaining.num_minutes(),
                "Signal detection cooling down"
            );
            return Ok(Vec::new());
        }

        let Some(raw) = self.raw_signals(symbol, timeframe)? else {
            return Ok(Vec::new());
        };
        if raw.is_empty() || !self.arm_cooldown(symbol, now) {
            return Ok(Vec::new());
        }

        let selected = select(raw);
        if !selected.is_empty() {
            let kinds: Vec<&str> = selected.iter().map(|s| s.kind.as_str()).collect();
            info!(symbol = %symbol, signals = ?kinds, "Signals detected");
        }
        Ok(selected)
    }

    /// Run detection without reading or arming the cooldown.
    ///
    /// # Errors
    /// Returns an error if candles cannot be loaded.
    pub fn preview(&self, symbol: &Symbol, timeframe: Timeframe) -> Result<Vec<Signal>> {
        Ok(self
            .raw_signals(symbol, timeframe)?
            .map(select)
            .unwrap_or_default())
    }

    /// Detect across `symbols`, keeping only symbols with signals.
    ///
    /// A failure on one symbol is collected and does not stop the round.
    pub fn detect_all(
        &self,
        symbols: &[Symbol],
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Detections {
        self.collect(symbols, |symbol| self.detect_at(symbol, timeframe, now))
    }

    /// [`preview`](Self::preview) across `symbols`.
    pub fn preview_all(
        &self,
        symbols: &[Symbol],
        timeframe: Timeframe,
    ) -> Detections {
        self.collect(symbols, |symbol| self.preview(symbol, timeframe))
    }

    /// Time left before `symbol` may be analysed again.
    #[must_use]
    pub fn cooldown_remaining(&self, symbol: &Symbol, now: DateTime<Utc>) -> Option<Duration> {
        let last = *self.last_detection.get(symbol)?;
        let elapsed = now - last;
        (elapsed < self.cooldown).then(|| self.cooldown - elapsed)
    }

    /// Check and arm the cooldown under the entry lock. Returns `false`
    /// when another round armed it first.
    fn arm_cooldown(&self, symbol: &Symbol, now: DateTime<Utc>) -> bool {
        match self.last_detection.entry(symbol.clone()) {
            Entry::Occupied(mut entry) => {
                if now - *entry.get() < self.cooldown {
                    return false;
                }
                entry.insert(now);
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
            }
        }
        true
    }

    fn raw_signals(&self, symbol: &Symbol, timeframe: Timeframe) -> Result<Option<Vec<Signal>>> {
        let candles = self
            .store
            .latest_candles(symbol, timeframe, LOOKBACK_CANDLES)?;
        if candles.len() < MIN_CANDLES {
            debug!(
                symbol = %symbol,
                timeframe = %timeframe,
                candles = candles.len(),
                "Not enough candles for signal detection"
            );
            return Ok(None);
        }
        Ok(Some(analyze(symbol, &candles)))
    }

    fn collect(
        &self,
        symbols: &[Symbol],
        run: impl Fn(&Symbol) -> Result<Vec<Signal>>,
    ) -> Detections {
        let mut out = Detections::default();
        for symbol in symbols {
            match run(symbol) {
                Ok(signals) if !signals.is_empty() => {
                    out.signals.insert(symbol.clone(), signals);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(symbol = %symbol, error = %e, "Signal detection failed");
                    out.failures.push((symbol.clone(), e));
                }
            }
        }
        out
    }
}

/// Every raw signal present in `candles` (oldest first).
#[must_use]
pub fn analyze(symbol: &Symbol, candles: &[Candle]) -> Vec<Signal> {
    let series = indicator::compute(candles, ANALYSIS_PERIODS);
    let snapshot = series.snapshot();
    let Some(price) = candles.last().map(|c| c.close) else {
        return Vec::new();
    };

    let mut signals = Vec::new();
    signals.extend(ma_cross(symbol, &series));
    signals.extend(macd_cross(symbol, &series));
    signals.extend(rsi_reversal(symbol, &series));
    signals.extend(bollinger_breakout(symbol, &series, price));
    signals.extend(volume_price_surge(symbol, candles));
    signals.extend(cci_reversal(symbol, &series));
    signals.extend(consensus(symbol, &snapshot));
    signals
}

/// Keep MEDIUM and stronger, strongest first, at most [`MAX_SIGNALS`].
#[must_use]
pub fn select(mut signals: Vec<Signal>) -> Vec<Signal> {
    signals.retain(|s| s.strength >= Strength::Medium);
    signals.sort_by(|a, b| b.strength.cmp(&a.strength));
    signals.truncate(MAX_SIGNALS);
    signals
}

/// Last `n` entries of a column with gaps removed.
fn recent(series: &[Option<f64>], n: usize) -> Vec<f64> {
    series[series.len().saturating_sub(n)..]
        .iter()
        .flatten()
        .copied()
        .collect()
}

/// `values[len - k]`.
fn back(values: &[f64], k: usize) -> Option<f64> {
    values.len().checked_sub(k).map(|i| values[i])
}

const fn priority_for(strength: Strength, strong: u8) -> u8 {
    if matches!(strength, Strength::VeryHigh) {
        4
    } else if matches!(strength, Strength::High) {
        strong
    } else {
        strong - 1
    }
}

fn signal(
    symbol: &Symbol,
    kind: SignalKind,
    strength: Strength,
    direction: Direction,
    value: f64,
    description: String,
    priority: u8,
) -> Signal {
    Signal {
        symbol: symbol.clone(),
        kind,
        strength,
        direction,
        value,
        description,
        priority,
    }
}

fn ma_cross(symbol: &Symbol, series: &IndicatorSeries) -> Option<Signal> {
    if series.ma_20.len() < 5 || series.ma_50.len() < 5 {
        return None;
    }
    let fast = recent(&series.ma_20, 5);
    let slow = recent(&series.ma_50, 5);
    if fast.len() < 4 || slow.len() < 4 {
        return None;
    }

    let (fast_now, slow_now) = (back(&fast, 1)?, back(&slow, 1)?);
    let prev = back(&fast, 2)? - back(&slow, 2)?;
    let curr = fast_now - slow_now;
    if slow_now == 0.0 {
        return None;
    }

    let (kind, direction, label) = if prev <= 0.0 && curr > 0.0 {
        (SignalKind::GoldenCross, Direction::Buy, "Golden cross")
    } else if prev >= 0.0 && curr < 0.0 {
        (SignalKind::DeadCross, Direction::Sell, "Dead cross")
    } else {
        return None;
    };

    let diff_pct = curr.abs() / slow_now * 100.0;
    let strength = if diff_pct > 1.0 {
        Strength::VeryHigh
    } else if diff_pct > 0.5 {
        Strength::High
    } else {
        Strength::Medium
    };
    Some(signal(
        symbol,
        kind,
        strength,
        direction,
        diff_pct,
        format!("{label} (MA20 {fast_now:.4}, MA50 {slow_now:.4})"),
        if strength == Strength::VeryHigh { 4 } else { 3 },
    ))
}

fn macd_cross(symbol: &Symbol, series: &IndicatorSeries) -> Option<Signal> {
    if series.macd.len() < 5 || series.macd_signal.len() < 5 {
        return None;
    }
    let line = recent(&series.macd, 5);
    let trigger = recent(&series.macd_signal, 5);
    if line.len() < 4 || trigger.len() < 4 {
        return None;
    }

    let (line_now, trigger_now) = (back(&line, 1)?, back(&trigger, 1)?);
    let prev = back(&line, 2)? - back(&trigger, 2)?;
    let curr = line_now - trigger_now;

    let (kind, direction, description) = if prev <= 0.0 && curr > 0.0 {
        (
            SignalKind::MacdBullishCross,
            Direction::Buy,
            format!("MACD crossed above signal ({line_now:.4} > {trigger_now:.4})"),
        )
    } else if prev >= 0.0 && curr < 0.0 {
        (
            SignalKind::MacdBearishCross,
            Direction::Sell,
            format!("MACD crossed below signal ({line_now:.4} < {trigger_now:.4})"),
        )
    } else {
        return None;
    };

    let strength = if curr.abs() > 0.001 {
        Strength::High
    } else {
        Strength::Medium
    };
    Some(signal(
        symbol,
        kind,
        strength,
        direction,
        curr.abs(),
        description,
        priority_for(strength, 3),
    ))
}

/// Latest value and the mean of the three values before it.
fn turn(series: &[Option<f64>]) -> Option<(f64, f64)> {
    if series.len() < 10 {
        return None;
    }
    let values = recent(series, 10);
    if values.len() < 8 {
        return None;
    }
    let current = back(&values, 1)?;
    let prior = (back(&values, 4)? + back(&values, 3)? + back(&values, 2)?) / 3.0;
    Some((current, prior))
}

fn rsi_reversal(symbol: &Symbol, series: &IndicatorSeries) -> Option<Signal> {
    let (rsi, prior) = turn(&series.rsi_14)?;

    if rsi <= 35.0 && rsi > prior {
        let strength = if rsi <= 25.0 {
            Strength::VeryHigh
        } else if rsi <= 30.0 {
            Strength::High
        } else {
            Strength::Medium
        };
        return Some(signal(
            symbol,
            SignalKind::RsiOversoldReversal,
            strength,
            Direction::Buy,
            rsi,
            format!("RSI turning up from oversold ({rsi:.1})"),
            if strength == Strength::VeryHigh { 4 } else { 3 },
        ));
    }

    if rsi >= 65.0 && rsi < prior {
        let strength = if rsi >= 75.0 {
            Strength::VeryHigh
        } else if rsi >= 70.0 {
            Strength::High
        } else {
            Strength::Medium
        };
        return Some(signal(
            symbol,
            SignalKind::RsiOverboughtReversal,
            strength,
            Direction::Sell,
            rsi,
            format!("RSI turning down from overbought ({rsi:.1})"),
            if strength == Strength::VeryHigh { 4 } else { 3 },
        ));
    }

    None
}

fn bollinger_breakout(symbol: &Symbol, series: &IndicatorSeries, price: f64) -> Option<Signal> {
    if series.bb_upper.len() < 20 || series.bb_lower.len() < 20 {
        return None;
    }
    let upper = recent(&series.bb_upper, 20);
    let lower = recent(&series.bb_lower, 20);
    let middle = recent(&series.bb_middle, 20);
    if upper.len() < 15 || lower.len() < 15 || middle.len() < 15 {
        return None;
    }

    let width = |k: usize| -> Option<f64> {
        let mid = back(&middle, k)?;
        if mid == 0.0 {
            return None;
        }
        Some((back(&upper, k)? - back(&lower, k)?) / mid * 100.0)
    };

    let current_width = width(1)?;
    let mut total = 0.0;
    for k in 2..=10 {
        total += width(k)?;
    }
    let avg_width = total / 9.0;
    if current_width <= avg_width * 1.2 {
        return None;
    }

    let prev_upper = back(&upper, 2)?;
    let prev_lower = back(&lower, 2)?;
    if price > prev_upper && prev_upper > 0.0 {
        Some(signal(
            symbol,
            SignalKind::BbUpwardBreakout,
            Strength::High,
            Direction::Buy,
            (price - prev_upper) / prev_upper * 100.0,
            format!("Broke above expanding upper band ({price:.4} > {prev_upper:.4})"),
            3,
        ))
    } else if price < prev_lower && prev_lower > 0.0 {
        Some(signal(
            symbol,
            SignalKind::BbDownwardBreakout,
            Strength::High,
            Direction::Sell,
            (prev_lower - price) / prev_lower * 100.0,
            format!("Broke below expanding lower band ({price:.4} < {prev_lower:.4})"),
            3,
        ))
    } else {
        None
    }
}

fn volume_price_surge(symbol: &Symbol, candles: &[Candle]) -> Option<Signal> {
    let n = candles.len();
    if n < 30 {
        return None;
    }
    let current = &candles[n - 1];
    let prev_close = candles[n - 2].close;
    let avg_volume = candles[n - 21..n - 1].iter().map(|c| c.volume).sum::<f64>() / 20.0;
    if avg_volume <= 0.0 || prev_close <= 0.0 || current.volume <= avg_volume * 2.5 {
        return None;
    }

    let change_pct = (current.close - prev_close) / prev_close * 100.0;
    let ratio = current.volume / avg_volume;
    let strength = if change_pct.abs() > 5.0 {
        Strength::VeryHigh
    } else {
        Strength::High
    };
    let description = format!("Volume {ratio:.1}x average with {change_pct:+.1}% move");

    let (kind, direction) = if change_pct > 2.0 {
        (SignalKind::VolumePriceSurgeUp, Direction::Buy)
    } else if change_pct < -2.0 {
        (SignalKind::VolumePriceSurgeDown, Direction::Sell)
    } else {
        return None;
    };
    Some(signal(
        symbol,
        kind,
        strength,
        direction,
        change_pct.abs(),
        description,
        if strength == Strength::VeryHigh { 4 } else { 3 },
    ))
}

fn cci_reversal(symbol: &Symbol, series: &IndicatorSeries) -> Option<Signal> {
    let (cci, prior) = turn(&series.cci_20)?;

    let (kind, direction, description) = if cci <= -80.0 && cci > prior {
        (
            SignalKind::CciOversoldReversal,
            Direction::Buy,
            format!("CCI turning up from oversold ({cci:.1})"),
        )
    } else if cci >= 80.0 && cci < prior {
        (
            SignalKind::CciOverboughtReversal,
            Direction::Sell,
            format!("CCI turning down from overbought ({cci:.1})"),
        )
    } else {
        return None;
    };

    let strength = if cci.abs() >= 120.0 {
        Strength::High
    } else {
        Strength::Medium
    };
    Some(signal(
        symbol,
        kind,
        strength,
        direction,
        cci,
        description,
        priority_for(strength, 3),
    ))
}

fn consensus(symbol: &Symbol, snapshot: &IndicatorSnapshot) -> Option<Signal> {
    let mut bullish = 0u8;
    let mut bearish = 0u8;

    if let Some(rsi) = snapshot.rsi_14 {
        if rsi < 40.0 {
            bullish += 1;
        } else if rsi > 60.0 {
            bearish += 1;
        }
    }
    if let (Some(line), Some(trigger)) = (snapshot.macd, snapshot.macd_signal) {
        if line > trigger {
            bullish += 1;
        } else {
            bearish += 1;
        }
    }
    if let (Some(fast), Some(slow)) = (snapshot.ma_20, snapshot.ma_50) {
        if fast > slow {
            bullish += 1;
        } else {
            bearish += 1;
        }
    }
    if let Some(cci) = snapshot.cci_20 {
        if cci < -50.0 {
            bullish += 1;
        } else if cci > 50.0 {
            bearish += 1;
        }
    }

    let (kind, direction, count, label) = if bullish >= 3 {
        (SignalKind::MultiIndicatorBullish, Direction::Buy, bullish, "bullish")
    } else if bearish >= 3 {
        (SignalKind::MultiIndicatorBearish, Direction::Sell, bearish, "bearish")
    } else {
        return None;
    };

    let strength = if count >= 4 {
        Strength::VeryHigh
    } else {
        Strength::High
    };
    Some(signal(
        symbol,
        kind,
        strength,
        direction,
        f64::from(count),
        format!("{count} indicators agree {label}"),
        if strength == Strength::VeryHigh { 4 } else { 3 },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryStore;
    use crate::testkit::domain::{candles_from_closes, surge_candles, trending_candles};

    fn sol() -> Symbol {
        Symbol::default_symbol()
    }

    fn raw(kind: SignalKind, strength: Strength) -> Signal {
        signal(&sol(), kind, strength, Direction::Buy, 0.0, String::new(), 3)
    }

    fn column(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn select_keeps_three_strongest() {
        let picked = select(vec![
            raw(SignalKind::GoldenCross, Strength::Medium),
            raw(SignalKind::MacdBullishCross, Strength::Low),
            raw(SignalKind::RsiOversoldReversal, Strength::VeryHigh),
            raw(SignalKind::CciOversoldReversal, Strength::High),
            raw(SignalKind::MultiIndicatorBullish, Strength::High),
        ]);
        let kinds: Vec<_> = picked.iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SignalKind::RsiOversoldReversal,
                SignalKind::CciOversoldReversal,
                SignalKind::MultiIndicatorBullish,
            ]
        );
    }

    #[test]
    fn golden_cross_strength_follows_gap() {
        let series = IndicatorSeries {
            ma_20: column(&[99.0, 99.0, 99.5, 99.8, 101.5]),
            ma_50: column(&[100.0, 100.0, 100.0, 100.0, 100.0]),
            ..Default::default()
        };
        let s = ma_cross(&sol(), &series).unwrap();
        assert_eq!(s.kind, SignalKind::GoldenCross);
        assert_eq!(s.strength, Strength::VeryHigh);
        assert_eq!(s.priority, 4);

        let series = IndicatorSeries {
            ma_20: column(&[101.0, 101.0, 100.5, 100.2, 99.8]),
            ma_50: column(&[100.0; 5]),
            ..Default::default()
        };
        let s = ma_cross(&sol(), &series).unwrap();
        assert_eq!(s.kind, SignalKind::DeadCross);
        assert_eq!(s.strength, Strength::Medium);
        assert_eq!(s.priority, 3);
    }

    #[test]
    fn no_cross_without_sign_change() {
        let series = IndicatorSeries {
            ma_20: column(&[101.0, 102.0, 103.0, 104.0, 105.0]),
            ma_50: column(&[100.0; 5]),
            ..Default::default()
        };
        assert!(ma_cross(&sol(), &series).is_none());
    }

    #[test]
    fn macd_cross_small_gap_is_medium() {
        let series = IndicatorSeries {
            macd: column(&[0.0, 0.0, 0.0, -0.0005, 0.0005]),
            macd_signal: column(&[0.0; 5]),
            ..Default::default()
        };
        let s = macd_cross(&sol(), &series).unwrap();
        assert_eq!(s.kind, SignalKind::MacdBullishCross);
        assert_eq!(s.strength, Strength::Medium);
        assert_eq!(s.priority, 2);
    }

    #[test]
    fn rsi_reversal_needs_upturn() {
        let series = IndicatorSeries {
            rsi_14: column(&[40.0, 38.0, 35.0, 32.0, 30.0, 28.0, 26.0, 24.0, 23.0, 24.5]),
            ..Default::default()
        };
        let s = rsi_reversal(&sol(), &series).unwrap();
        assert_eq!(s.kind, SignalKind::RsiOversoldReversal);
        assert_eq!(s.strength, Strength::VeryHigh);

        let falling = IndicatorSeries {
            rsi_14: column(&[40.0, 38.0, 35.0, 32.0, 30.0, 28.0, 26.0, 24.0, 23.0, 22.0]),
            ..Default::default()
        };
        assert!(rsi_reversal(&sol(), &falling).is_none());
    }

    #[test]
    fn rsi_reversal_needs_eight_values() {
        let mut values = vec![None; 3];
        values.extend(column(&[70.0, 72.0, 74.0, 76.0, 78.0, 80.0, 70.0]));
        let series = IndicatorSeries {
            rsi_14: values,
            ..Default::default()
        };
        assert!(rsi_reversal(&sol(), &series).is_none());
    }

    #[test]
    fn cci_overbought_reversal() {
        let series = IndicatorSeries {
            cci_20: column(&[50.0, 80.0, 100.0, 120.0, 140.0, 160.0, 170.0, 180.0, 175.0, 130.0]),
            ..Default::default()
        };
        let s = cci_reversal(&sol(), &series).unwrap();
        assert_eq!(s.kind, SignalKind::CciOverboughtReversal);
        assert_eq!(s.strength, Strength::High);
        assert_eq!(s.direction, Direction::Sell);
    }

    #[test]
    fn bollinger_breakout_after_expansion() {
        let mut upper = vec![101.0; 19];
        let mut lower = vec![99.0; 19];
        upper.push(106.0);
        lower.push(94.0);
        let series = IndicatorSeries {
            bb_upper: column(&upper),
            bb_middle: column(&[100.0; 20]),
            bb_lower: column(&lower),
            ..Default::default()
        };
        let s = bollinger_breakout(&sol(), &series, 103.0).unwrap();
        assert_eq!(s.kind, SignalKind::BbUpwardBreakout);
        assert!((s.value - 2.0 / 101.0 * 100.0).abs() < 1e-9);

        assert!(bollinger_breakout(&sol(), &series, 100.0).is_none());
    }

    #[test]
    fn volume_surge_requires_price_move() {
        let mut candles = candles_from_closes(&[100.0; 30]);
        let last = candles.last_mut().unwrap();
        last.volume = 3_000.0;
        last.close = 106.0;
        last.high = 106.0;
        let s = volume_price_surge(&sol(), &candles).unwrap();
        assert_eq!(s.kind, SignalKind::VolumePriceSurgeUp);
        assert_eq!(s.strength, Strength::VeryHigh);

        let last = candles.last_mut().unwrap();
        last.close = 101.0;
        assert!(volume_price_surge(&sol(), &candles).is_none());
    }

    #[test]
    fn consensus_counts_agreeing_indicators() {
        let snapshot = IndicatorSnapshot {
            rsi_14: Some(70.0),
            macd: Some(-1.0),
            macd_signal: Some(0.0),
            ma_20: Some(99.0),
            ma_50: Some(100.0),
            cci_20: Some(0.0),
            ..Default::default()
        };
        let s = consensus(&sol(), &snapshot).unwrap();
        assert_eq!(s.kind, SignalKind::MultiIndicatorBearish);
        assert_eq!(s.strength, Strength::High);
        assert!((s.value - 3.0).abs() < f64::EPSILON);
    }

    fn seeded_detector() -> SignalDetector {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_candles(&sol(), Timeframe::M5, &surge_candles(150, 100.0, 6.0))
            .unwrap();
        SignalDetector::new(store, Duration::minutes(60))
    }

    #[test]
    fn detection_arms_cooldown() {
        let detector = seeded_detector();
        let now = Utc::now();

        let first = detector.detect_at(&sol(), Timeframe::M5, now).unwrap();
        assert!(!first.is_empty());
        assert!(detector.cooldown_remaining(&sol(), now).is_some());

        let again = detector
            .detect_at(&sol(), Timeframe::M5, now + Duration::minutes(30))
            .unwrap();
        assert!(again.is_empty());

        let later = detector
            .detect_at(&sol(), Timeframe::M5, now + Duration::minutes(61))
            .unwrap();
        assert!(!later.is_empty());
    }

    #[test]
    fn preview_ignores_cooldown() {
        let detector = seeded_detector();
        let now = Utc::now();
        detector.detect_at(&sol(), Timeframe::M5, now).unwrap();

        assert!(!detector.preview(&sol(), Timeframe::M5).unwrap().is_empty());
        assert!(detector.cooldown_remaining(&sol(), now).is_some());
    }

    #[test]
    fn concurrent_rounds_fire_once() {
        let detector = seeded_detector();
        let now = Utc::now();
        let fired: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| detector.detect_at(&sol(), Timeframe::M5, now).unwrap()))
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(!h.join().unwrap().is_empty()))
                .sum()
        });
        assert_eq!(fired, 1);
    }

    #[test]
    fn short_history_is_skipped() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_candles(&sol(), Timeframe::M5, &trending_candles(60, 100.0, 0.3))
            .unwrap();
        let detector = SignalDetector::new(store, Duration::minutes(60));
        assert!(detector.detect(&sol(), Timeframe::M5).unwrap().is_empty());
        assert!(detector.cooldown_remaining(&sol(), Utc::now()).is_none());
    }

    #[test]
    fn detect_all_drops_quiet_symbols() {
        let detector = seeded_detector();
        let eth = Symbol::normalize("ETH").unwrap();
        let all = detector.detect_all(&[sol(), eth], Timeframe::M5, Utc::now());
        assert_eq!(all.signals.len(), 1);
        assert!(all.signals.contains_key(&sol()));
        assert!(all.failures.is_empty());
    }
}
