//! In-memory store used by tests and embedded setups.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::{
    AnalysisRecord, Candle, NewAnalysis, PriceTick, Symbol, Timeframe, Verification,
};
use crate::error::{Error, Result};
use crate::port::{AnalysisStore, MarketStore, StoredSnapshot};

type SeriesKey = (Symbol, Timeframe);

/// Implements both store ports over maps guarded by `parking_lot` locks.
#[derive(Default)]
pub struct MemoryStore {
    candles: RwLock<HashMap<SeriesKey, BTreeMap<DateTime<Utc>, Candle>>>,
    prices: RwLock<HashMap<Symbol, Vec<PriceTick>>>,
    snapshots: RwLock<HashMap<SeriesKey, BTreeMap<DateTime<Utc>, StoredSnapshot>>>,
    analyses: RwLock<Vec<AnalysisRecord>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MarketStore for MemoryStore {
    fn insert_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        candles: &[Candle],
    ) -> Result<usize> {
        let mut all = self.candles.write();
        let series = all.entry((symbol.clone(), timeframe)).or_default();
        for candle in candles {
            series.insert(candle.timestamp, candle.clone());
        }
        Ok(candles.len())
    }

    fn latest_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        let all = self.candles.read();
        let Some(series) = all.get(&(symbol.clone(), timeframe)) else {
            return Ok(Vec::new());
        };
        let mut out: Vec<Candle> = series.values().rev().take(limit).cloned().collect();
        out.reverse();
        Ok(out)
    }

    fn last_candle_time(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
    ) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .candles
            .read()
            .get(&(symbol.clone(), timeframe))
            .and_then(|series| series.keys().next_back().copied()))
    }

    fn insert_price(&self, tick: &PriceTick) -> Result<()> {
        self.prices
            .write()
            .entry(tick.symbol.clone())
            .or_default()
            .push(tick.clone());
        Ok(())
    }

    fn latest_price(&self, symbol: &Symbol) -> Result<Option<PriceTick>> {
        Ok(self
            .prices
            .read()
            .get(symbol)
            .and_then(|ticks| ticks.iter().max_by_key(|t| t.timestamp).cloned()))
    }

    fn save_snapshot(&self, snapshot: &StoredSnapshot) -> Result<()> {
        self.snapshots
            .write()
            .entry((snapshot.symbol.clone(), snapshot.timeframe))
            .or_default()
            .insert(snapshot.timestamp, snapshot.clone());
        Ok(())
    }

    fn latest_snapshot(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
    ) -> Result<Option<StoredSnapshot>> {
        Ok(self
            .snapshots
            .read()
            .get(&(symbol.clone(), timeframe))
            .and_then(|series| series.values().next_back().cloned()))
    }

    fn symbols(&self) -> Result<Vec<Symbol>> {
        let mut symbols: Vec<Symbol> = self
            .candles
            .read()
            .iter()
            .filter(|(_, series)| !series.is_empty())
            .map(|((symbol, _), _)| symbol.clone())
            .collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    fn ping(&self) -> Result<()> {
        Ok(())
    }
}

impl AnalysisStore for MemoryStore {
    fn record(&self, analysis: &NewAnalysis, created_at: DateTime<Utc>) -> Result<AnalysisRecord> {
        let mut analyses = self.analyses.write();
        let record = AnalysisRecord {
            id: analyses.len() as i64 + 1,
            symbol: analysis.symbol.clone(),
            agent_name: analysis.agent_name.clone(),
            recommendation: analysis.recommendation,
            confidence: analysis.confidence,
            analysis: analysis.analysis.clone(),
            entry_price: analysis.entry_price,
            target_price: analysis.target_price,
            stop_loss: analysis.stop_loss,
            created_at,
            verification: None,
        };
        analyses.push(record.clone());
        Ok(record)
    }

    fn history(&self, symbol: Option<&Symbol>, limit: usize) -> Result<Vec<AnalysisRecord>> {
        let mut out: Vec<AnalysisRecord> = self
            .analyses
            .read()
            .iter()
            .filter(|a| symbol.map_or(true, |s| &a.symbol == s))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        out.truncate(limit);
        Ok(out)
    }

    fn pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<AnalysisRecord>> {
        let mut out: Vec<AnalysisRecord> = self
            .analyses
            .read()
            .iter()
            .filter(|a| a.verification.is_none() && a.created_at <= cutoff)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    fn record_verification(&self, id: i64, verification: &Verification) -> Result<()> {
        let mut analyses = self.analyses.write();
        let record = analyses
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(format!("analysis {id}")))?;
        record.verification = Some(verification.clone());
        Ok(())
    }
}
