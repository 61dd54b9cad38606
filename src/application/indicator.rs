//! Technical indicator math.
//!
//! All functions return a series aligned with their input. Entries are `None`
//! while the indicator is still warming up or when the math is undefined
//! (a zero divisor, for example).

use crate::domain::indicator::IndicatorSeries;
use crate::domain::Candle;

pub const RSI_PERIOD: usize = 14;
pub const MA_FAST: usize = 20;
pub const MA_SLOW: usize = 50;
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
pub const BB_PERIOD: usize = 20;
pub const BB_WIDTH: f64 = 2.0;
pub const CCI_PERIOD: usize = 20;

/// Lambert's constant scaling CCI into roughly ±100.
const CCI_SCALE: f64 = 0.015;

/// Relative strength index over simple rolling means of gains and losses.
///
/// The first bar has no previous close and counts as a zero move, so the
/// first value appears at index `period - 1`.
#[must_use]
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    for (i, close) in closes.iter().enumerate() {
        let delta = if i == 0 { 0.0 } else { close - closes[i - 1] };
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));
    }

    let avg_gain = sma(&gains, period);
    let avg_loss = sma(&losses, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(gain, loss)| match (gain?, loss?) {
            (g, l) if l == 0.0 => (g > 0.0).then_some(100.0),
            (g, l) => Some(100.0 - 100.0 / (1.0 + g / l)),
        })
        .collect()
}

/// Simple moving average.
#[must_use]
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |window| Some(mean(window)))
}

/// Exponential moving average with `alpha = 2 / (span + 1)`.
///
/// Weights are normalized over the observed history, so the series is
/// defined from the first value on instead of seeding with an SMA.
#[must_use]
pub fn ema(values: &[f64], span: usize) -> Vec<f64> {
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;
    let mut num = 0.0;
    let mut den = 0.0;
    values
        .iter()
        .map(|x| {
            num = x + decay * num;
            den = 1.0 + decay * den;
            num / den
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Macd {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

#[must_use]
pub fn macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> Macd {
    let fast = ema(closes, fast);
    let slow = ema(closes, slow);
    let line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
    let signal = ema(&line, signal);
    let histogram = line.iter().zip(&signal).map(|(m, s)| m - s).collect();
    Macd {
        macd: line,
        signal,
        histogram,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bands {
    pub upper: Vec<Option<f64>>,
    pub middle: Vec<Option<f64>>,
    pub lower: Vec<Option<f64>>,
}

/// Bollinger bands: SMA ± `width` sample standard deviations.
#[must_use]
pub fn bollinger(closes: &[f64], period: usize, width: f64) -> Bands {
    let middle = sma(closes, period);
    let std = rolling(closes, period, sample_std);

    let (upper, lower) = middle
        .iter()
        .zip(&std)
        .map(|(m, s)| match (m, s) {
            (Some(m), Some(s)) => (Some(m + width * s), Some(m - width * s)),
            _ => (None, None),
        })
        .unzip();

    Bands {
        upper,
        middle,
        lower,
    }
}

/// Commodity channel index on the typical price.
#[must_use]
pub fn cci(candles: &[Candle], period: usize) -> Vec<Option<f64>> {
    let typical: Vec<f64> = candles.iter().map(Candle::typical_price).collect();
    rolling(&typical, period, |window| {
        let avg = mean(window);
        let mad = window.iter().map(|x| (x - avg).abs()).sum::<f64>() / window.len() as f64;
        let last = *window.last()?;
        if mad == 0.0 {
            return None;
        }
        Some((last - avg) / (CCI_SCALE * mad))
    })
}

/// Full indicator set over `candles`, keeping the last `periods` values of
/// each column rounded to four decimals.
///
/// Undefined values are dropped before taking the tail and the result is
/// left-padded with `None`, so every column has exactly `periods` entries.
#[must_use]
pub fn compute(candles: &[Candle], periods: usize) -> IndicatorSeries {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let macd = macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
    let bands = bollinger(&closes, BB_PERIOD, BB_WIDTH);
    let wrap = |values: Vec<f64>| values.into_iter().map(Some).collect::<Vec<_>>();

    IndicatorSeries {
        rsi_14: tail(rsi(&closes, RSI_PERIOD), periods),
        ma_20: tail(sma(&closes, MA_FAST), periods),
        ma_50: tail(sma(&closes, MA_SLOW), periods),
        macd: tail(wrap(macd.macd), periods),
        macd_signal: tail(wrap(macd.signal), periods),
        macd_histogram: tail(wrap(macd.histogram), periods),
        bb_upper: tail(bands.upper, periods),
        bb_middle: tail(bands.middle, periods),
        bb_lower: tail(bands.lower, periods),
        cci_20: tail(cci(candles, CCI_PERIOD), periods),
    }
}

/// Round to four decimals.
#[must_use]
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn tail(series: Vec<Option<f64>>, periods: usize) -> Vec<Option<f64>> {
    let defined: Vec<f64> = series
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .collect();
    let start = defined.len().saturating_sub(periods);
    let kept = &defined[start..];

    let mut out = vec![None; periods - kept.len()];
    out.extend(kept.iter().map(|v| Some(round4(*v))));
    out
}

fn rolling(
    values: &[f64],
    period: usize,
    f: impl Fn(&[f64]) -> Option<f64>,
) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                None
            } else {
                f(&values[i + 1 - period..=i])
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values);
    let var = values.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::domain::{candles_from_closes, trending_candles};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn sma_warms_up() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn ema_normalizes_weights() {
        let out = ema(&[1.0, 2.0], 3);
        assert!(close(out[0], 1.0));
        assert!(close(out[1], 2.5 / 1.5));
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (1..=20).map(f64::from).collect();
        let out = rsi(&closes, 14);
        assert_eq!(out[12], None);
        assert_eq!(out[13], Some(100.0));
        assert_eq!(out[19], Some(100.0));
    }

    #[test]
    fn rsi_flat_is_undefined() {
        let out = rsi(&[5.0; 20], 14);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_balanced_moves_is_50() {
        let closes: Vec<f64> = (0..30).map(|i| if i % 2 == 0 { 10.0 } else { 11.0 }).collect();
        let out = rsi(&closes, 14);
        let last = out.last().copied().flatten().unwrap();
        assert!((last - 50.0).abs() < 1e-9);
    }

    #[test]
    fn bollinger_uses_sample_std() {
        let bands = bollinger(&[1.0, 2.0, 3.0, 4.0], 4, 2.0);
        let std = (5.0f64 / 3.0).sqrt();
        assert!(close(bands.middle[3].unwrap(), 2.5));
        assert!(close(bands.upper[3].unwrap(), 2.5 + 2.0 * std));
        assert!(close(bands.lower[3].unwrap(), 2.5 - 2.0 * std));
        assert_eq!(bands.upper[2], None);
    }

    #[test]
    fn cci_is_undefined_for_flat_prices() {
        let candles = candles_from_closes(&[10.0; 25]);
        assert!(cci(&candles, 20).iter().all(Option::is_none));
    }

    #[test]
    fn cci_is_positive_in_uptrend() {
        let candles = trending_candles(40, 100.0, 1.0);
        let last = cci(&candles, 20).last().copied().flatten().unwrap();
        assert!(last > 0.0);
    }

    #[test]
    fn macd_is_positive_in_uptrend() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + f64::from(i)).collect();
        let out = macd(&closes, 12, 26, 9);
        assert!(out.macd[59] > 0.0);
        assert!(close(out.histogram[59], out.macd[59] - out.signal[59]));
    }

    #[test]
    fn compute_right_aligns_and_pads() {
        let candles = trending_candles(60, 100.0, 0.5);
        let series = compute(&candles, 50);

        assert_eq!(series.ma_50.len(), 50);
        // 60 candles give only 11 defined MA50 values.
        assert_eq!(series.ma_50.iter().filter(|v| v.is_some()).count(), 11);
        assert!(series.ma_50[0].is_none());
        assert!(series.ma_50[49].is_some());

        let snapshot = series.snapshot();
        assert!(snapshot.ma_20.unwrap() > snapshot.ma_50.unwrap());
        assert_eq!(snapshot.macd, series.macd[49]);
    }

    #[test]
    fn compute_on_empty_input_is_all_none() {
        let series = compute(&[], 10);
        assert_eq!(series.rsi_14, vec![None; 10]);
        assert!(series.snapshot().is_empty());
    }

    #[test]
    fn round4_rounds_half_away() {
        assert!(close(round4(1.234_56), 1.2346));
        assert!(close(round4(-0.000_04), 0.0));
    }
}
