//! Database model types for Diesel ORM.
//!
//! Timestamps are stored as fixed-width RFC 3339 text in UTC so that
//! lexical order matches chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::prelude::*;

use super::schema::{analyses, candles, indicator_snapshots, price_ticks};
use crate::domain::{
    AnalysisRecord, Candle, IndicatorSnapshot, NewAnalysis, Outcome, PriceTick, Recommendation,
    Symbol, Timeframe, Verification,
};
use crate::error::{Error, Result};
use crate::port::StoredSnapshot;

/// Encode a timestamp for storage.
#[must_use]
pub fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a stored timestamp.
///
/// # Errors
/// Returns [`Error::Parse`] for text that is not RFC 3339.
pub fn decode_time(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(|e| Error::Parse(format!("timestamp '{raw}': {e}")))?
        .with_timezone(&Utc))
}

fn decode_symbol(raw: &str) -> Result<Symbol> {
    Symbol::normalize(raw).map_err(|e| Error::Parse(e.to_string()))
}

/// Candle row (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = candles)]
pub struct NewCandleRow {
    pub symbol: String,
    pub timeframe: String,
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl NewCandleRow {
    #[must_use]
    pub fn new(symbol: &Symbol, timeframe: Timeframe, candle: &Candle) -> Self {
        Self {
            symbol: symbol.as_str().to_string(),
            timeframe: timeframe.as_str().to_string(),
            timestamp: encode_time(candle.timestamp),
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
        }
    }
}

/// Candle row (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = candles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CandleRow {
    pub id: i64,
    pub symbol: String,
    pub timeframe: String,
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl TryFrom<CandleRow> for Candle {
    type Error = Error;

    fn try_from(row: CandleRow) -> Result<Self> {
        Ok(Self {
            timestamp: decode_time(&row.timestamp)?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        })
    }
}

/// Ticker row (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = price_ticks)]
pub struct NewPriceRow {
    pub symbol: String,
    pub price: f64,
    pub volume_24h: f64,
    pub change_24h: f64,
    pub timestamp: String,
}

impl From<&PriceTick> for NewPriceRow {
    fn from(tick: &PriceTick) -> Self {
        Self {
            symbol: tick.symbol.as_str().to_string(),
            price: tick.price,
            volume_24h: tick.volume_24h,
            change_24h: tick.change_24h,
            timestamp: encode_time(tick.timestamp),
        }
    }
}

/// Ticker row (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = price_ticks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PriceRow {
    pub id: i64,
    pub symbol: String,
    pub price: f64,
    pub volume_24h: f64,
    pub change_24h: f64,
    pub timestamp: String,
}

impl TryFrom<PriceRow> for PriceTick {
    type Error = Error;

    fn try_from(row: PriceRow) -> Result<Self> {
        Ok(Self {
            symbol: decode_symbol(&row.symbol)?,
            price: row.price,
            volume_24h: row.volume_24h,
            change_24h: row.change_24h,
            timestamp: decode_time(&row.timestamp)?,
        })
    }
}

/// Indicator snapshot row (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = indicator_snapshots)]
pub struct NewSnapshotRow {
    pub symbol: String,
    pub timeframe: String,
    pub timestamp: String,
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

impl From<&StoredSnapshot> for NewSnapshotRow {
    fn from(stored: &StoredSnapshot) -> Self {
        let s = &stored.snapshot;
        Self {
            symbol: stored.symbol.as_str().to_string(),
            timeframe: stored.timeframe.as_str().to_string(),
            timestamp: encode_time(stored.timestamp),
            rsi_14: s.rsi_14,
            ma_20: s.ma_20,
            ma_50: s.ma_50,
            macd: s.macd,
            macd_signal: s.macd_signal,
            bb_upper: s.bb_upper,
            bb_middle: s.bb_middle,
            bb_lower: s.bb_lower,
            cci_20: s.cci_20,
        }
    }
}

/// Indicator snapshot row (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = indicator_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SnapshotRow {
    pub id: i64,
    pub symbol: String,
    pub timeframe: String,
    pub timestamp: String,
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

impl TryFrom<SnapshotRow> for StoredSnapshot {
    type Error = Error;

    fn try_from(row: SnapshotRow) -> Result<Self> {
        Ok(Self {
            symbol: decode_symbol(&row.symbol)?,
            timeframe: row
                .timeframe
                .parse()
                .map_err(|e: crate::domain::error::DomainError| Error::Parse(e.to_string()))?,
            timestamp: decode_time(&row.timestamp)?,
            snapshot: IndicatorSnapshot {
                rsi_14: row.rsi_14,
                ma_20: row.ma_20,
                ma_50: row.ma_50,
                macd: row.macd,
                macd_signal: row.macd_signal,
                bb_upper: row.bb_upper,
                bb_middle: row.bb_middle,
                bb_lower: row.bb_lower,
                cci_20: row.cci_20,
            },
        })
    }
}

/// Analysis row (insertable).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = analyses)]
pub struct NewAnalysisRow {
    pub symbol: String,
    pub agent_name: Option<String>,
    pub recommendation: String,
    pub confidence: f64,
    pub analysis: String,
    pub entry_price: f64,
    pub target_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub created_at: String,
}

impl NewAnalysisRow {
    #[must_use]
    pub fn new(analysis: &NewAnalysis, created_at: DateTime<Utc>) -> Self {
        Self {
            symbol: analysis.symbol.as_str().to_string(),
            agent_name: analysis.agent_name.clone(),
            recommendation: analysis.recommendation.as_str().to_string(),
            confidence: analysis.confidence,
            analysis: analysis.analysis.clone(),
            entry_price: analysis.entry_price,
            target_price: analysis.target_price,
            stop_loss: analysis.stop_loss,
            created_at: encode_time(created_at),
        }
    }
}

/// Analysis row (queryable).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = analyses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AnalysisRow {
    pub id: i64,
    pub symbol: String,
    pub agent_name: Option<String>,
    pub recommendation: String,
    pub confidence: f64,
    pub analysis: String,
    pub entry_price: f64,
    pub target_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub created_at: String,
    pub outcome: Option<String>,
    pub verified_price: Option<f64>,
    pub change_pct: Option<f64>,
    pub verified_at: Option<String>,
}

impl TryFrom<AnalysisRow> for AnalysisRecord {
    type Error = Error;

    fn try_from(row: AnalysisRow) -> Result<Self> {
        let verification = match (row.outcome, row.verified_price, row.verified_at) {
            (Some(outcome), Some(price), Some(verified_at)) => Some(Verification {
                outcome: outcome
                    .parse::<Outcome>()
                    .map_err(|e| Error::Parse(e.to_string()))?,
                price,
                change_pct: row.change_pct.unwrap_or_default(),
                verified_at: decode_time(&verified_at)?,
            }),
            _ => None,
        };

        Ok(Self {
            id: row.id,
            symbol: decode_symbol(&row.symbol)?,
            agent_name: row.agent_name,
            recommendation: row
                .recommendation
                .parse::<Recommendation>()
                .map_err(|e| Error::Parse(e.to_string()))?,
            confidence: row.confidence,
            analysis: row.analysis,
            entry_price: row.entry_price,
            target_price: row.target_price,
            stop_loss: row.stop_loss,
            created_at: decode_time(&row.created_at)?,
            verification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn encoded_times_sort_lexically() {
        let a = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(1500);
        let (ea, eb) = (encode_time(a), encode_time(b));
        assert_eq!(ea.len(), eb.len());
        assert!(ea < eb);
        assert_eq!(decode_time(&eb).unwrap(), b);
    }

    #[test]
    fn partial_verification_columns_read_as_unverified() {
        let row = AnalysisRow {
            id: 1,
            symbol: "SOL/USDT".to_string(),
            agent_name: None,
            recommendation: "BUY".to_string(),
            confidence: 0.5,
            analysis: String::new(),
            entry_price: 10.0,
            target_price: None,
            stop_loss: None,
            created_at: encode_time(Utc::now()),
            outcome: Some("success".to_string()),
            verified_price: None,
            change_pct: None,
            verified_at: None,
        };
        let record = AnalysisRecord::try_from(row).unwrap();
        assert!(record.verification.is_none());
    }

    #[test]
    fn bad_timestamp_is_parse_error() {
        assert!(matches!(decode_time("yesterday"), Err(Error::Parse(_))));
    }
}
