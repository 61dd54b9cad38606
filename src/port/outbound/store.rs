//! Persistence ports for market data and recorded analyses.

use chrono::{DateTime, Utc};

use crate::domain::{
    AnalysisRecord, Candle, IndicatorSnapshot, NewAnalysis, PriceTick, Symbol, Timeframe,
    Verification,
};
use crate::error::Result;

/// Indicator snapshot as persisted for one candle.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    /// Open time of the candle the snapshot was computed at.
    pub timestamp: DateTime<Utc>,
    pub snapshot: IndicatorSnapshot,
}

/// Storage operations for candles, ticker prices and indicator snapshots.
pub trait MarketStore: Send + Sync {
    /// Upsert candles keyed by symbol, timeframe and open time.
    ///
    /// Returns the number of rows written.
    fn insert_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<usize>;

    /// Most recent `limit` candles, oldest first.
    fn latest_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>>;

    /// Open time of the newest stored candle.
    fn last_candle_time(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
    ) -> Result<Option<DateTime<Utc>>>;

    /// Append a ticker reading.
    fn insert_price(&self, tick: &PriceTick) -> Result<()>;

    /// Newest ticker reading for a symbol.
    fn latest_price(&self, symbol: &Symbol) -> Result<Option<PriceTick>>;

    /// Save a snapshot, replacing one at the same candle.
    fn save_snapshot(&self, snapshot: &StoredSnapshot) -> Result<()>;

    /// Newest snapshot for a symbol and timeframe.
    fn latest_snapshot(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
    ) -> Result<Option<StoredSnapshot>>;

    /// Every symbol that has at least one candle.
    fn symbols(&self) -> Result<Vec<Symbol>>;

    /// Cheap round-trip used by health checks.
    fn ping(&self) -> Result<()>;
}

/// Storage operations for analyses and their verification.
pub trait AnalysisStore: Send + Sync {
    /// Persist a new analysis and return it with its id.
    fn record(&self, analysis: &NewAnalysis, created_at: DateTime<Utc>)
        -> Result<AnalysisRecord>;

    /// Newest analyses first, optionally for one symbol.
    fn history(&self, symbol: Option<&Symbol>, limit: usize) -> Result<Vec<AnalysisRecord>>;

    /// Unverified analyses created at or before `cutoff`, oldest first.
    fn pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<AnalysisRecord>>;

    /// Attach a verification result.
    ///
    /// Fails with [`Error::NotFound`](crate::error::Error::NotFound) when no
    /// analysis has this id.
    fn record_verification(&self, id: i64, verification: &Verification) -> Result<()>;
}
