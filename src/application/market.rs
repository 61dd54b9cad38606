//! Market data use cases: ingest, technical reports and data freshness.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::application::indicator;
use crate::domain::error::DomainError;
use crate::domain::indicator::{IndicatorSeries, IndicatorSnapshot, Readings};
use crate::domain::{Candle, PriceTick, Symbol, Timeframe};
use crate::error::{Error, Result};
use crate::port::{MarketStore, StoredSnapshot};

/// Minimum candles loaded for a technical report.
pub const MIN_REPORT_CANDLES: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolInfo {
    pub symbol: Symbol,
    pub display_name: String,
    pub has_data: bool,
    pub collecting: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub received: usize,
    pub stored: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TechnicalReport {
    pub symbol: Symbol,
    pub symbol_display: String,
    pub timeframe: Timeframe,
    pub analysis_periods: usize,
    pub current_price: f64,
    pub current_indicators: IndicatorSnapshot,
    pub indicators_timeseries: IndicatorSeries,
    pub recent_candles: Vec<Candle>,
    pub recent_volumes: Vec<f64>,
    pub signals: Readings,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiTimeframeReport {
    pub symbol: Symbol,
    pub symbol_display: String,
    pub timeframes_used: Vec<Timeframe>,
    pub failed_timeframes: Vec<Timeframe>,
    pub analysis_periods: usize,
    pub timeframe_data: BTreeMap<Timeframe, TechnicalReport>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FreshnessStatus {
    /// Newest candle is at most two intervals old.
    Fresh,
    /// At most six intervals old.
    Stale,
    Old,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeframeFreshness {
    pub status: FreshnessStatus,
    pub last_update: Option<DateTime<Utc>>,
    pub age_minutes: Option<f64>,
}

impl TimeframeFreshness {
    #[must_use]
    pub fn assess(timeframe: Timeframe, last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        let Some(last) = last else {
            return Self {
                status: FreshnessStatus::NoData,
                last_update: None,
                age_minutes: None,
            };
        };
        let age = now - last;
        let interval = timeframe.duration();
        let status = if age <= interval * 2 {
            FreshnessStatus::Fresh
        } else if age <= interval * 6 {
            FreshnessStatus::Stale
        } else {
            FreshnessStatus::Old
        };
        Self {
            status,
            last_update: Some(last),
            age_minutes: Some((age.num_seconds() as f64 / 6.0).round() / 10.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FreshnessReport {
    pub symbols: BTreeMap<Symbol, BTreeMap<Timeframe, TimeframeFreshness>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshReport {
    pub refreshed: usize,
    pub failed: usize,
    pub results: BTreeMap<Symbol, BTreeMap<Timeframe, String>>,
    /// Failures other than missing data.
    pub errors: Vec<String>,
}

/// Market data service shared by the HTTP API and the scheduler.
pub struct MarketService {
    store: Arc<dyn MarketStore>,
    active: RwLock<Vec<Symbol>>,
    timeframes: Vec<Timeframe>,
    default_periods: usize,
}

impl MarketService {
    #[must_use]
    pub fn new(
        store: Arc<dyn MarketStore>,
        symbols: Vec<Symbol>,
        timeframes: Vec<Timeframe>,
        default_periods: usize,
    ) -> Self {
        Self {
            store,
            active: RwLock::new(dedup(symbols)),
            timeframes,
            default_periods,
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn MarketStore> {
        &self.store
    }

    /// Timeframes kept fresh by refresh rounds.
    #[must_use]
    pub fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    #[must_use]
    pub fn default_periods(&self) -> usize {
        self.default_periods
    }

    #[must_use]
    pub fn active_symbols(&self) -> Vec<Symbol> {
        self.active.read().clone()
    }

    /// Replace the tracked symbol set.
    ///
    /// # Errors
    /// Returns [`DomainError::EmptySymbol`] when `symbols` is empty.
    pub fn set_active_symbols(&self, symbols: Vec<Symbol>) -> Result<Vec<Symbol>> {
        let symbols = dedup(symbols);
        if symbols.is_empty() {
            return Err(DomainError::EmptySymbol.into());
        }
        info!(symbols = ?symbols.iter().map(Symbol::as_str).collect::<Vec<_>>(), "Active symbols updated");
        *self.active.write() = symbols.clone();
        Ok(symbols)
    }

    /// Active symbols plus every symbol with stored candles.
    ///
    /// # Errors
    /// Returns an error if the store cannot list symbols.
    pub fn known_symbols(&self) -> Result<Vec<SymbolInfo>> {
        let active = self.active_symbols();
        let stored = self.store.symbols()?;

        let mut all: Vec<Symbol> = active.iter().chain(stored.iter()).cloned().collect();
        all.sort();
        all.dedup();

        Ok(all
            .into_iter()
            .map(|symbol| SymbolInfo {
                display_name: symbol.display_name().to_string(),
                has_data: stored.contains(&symbol),
                collecting: active.contains(&symbol),
                symbol,
            })
            .collect())
    }

    /// Validate and upsert a batch of candles.
    ///
    /// The batch is rejected as a whole if any candle is malformed.
    ///
    /// # Errors
    /// Returns a domain error for invalid candles or a storage error.
    pub fn ingest_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        mut candles: Vec<Candle>,
    ) -> Result<IngestReport> {
        for candle in &candles {
            candle.validate()?;
        }
        let received = candles.len();
        // Later duplicates in the batch win, matching the store upsert.
        candles.reverse();
        candles.sort_by_key(|c| c.timestamp);
        candles.dedup_by_key(|c| c.timestamp);

        let stored = self.store.insert_candles(symbol, timeframe, &candles)?;
        debug!(symbol = %symbol, timeframe = %timeframe, received, stored, "Candles ingested");
        Ok(IngestReport {
            symbol: symbol.clone(),
            timeframe,
            received,
            stored,
        })
    }

    /// # Errors
    /// Returns a storage error.
    pub fn latest_candles(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>> {
        self.store.latest_candles(symbol, timeframe, limit)
    }

    /// # Errors
    /// Returns a storage error.
    pub fn ingest_price(&self, tick: &PriceTick) -> Result<()> {
        self.store.insert_price(tick)
    }

    /// # Errors
    /// Returns [`Error::NotFound`] when no price was ever ingested.
    pub fn latest_price(&self, symbol: &Symbol) -> Result<PriceTick> {
        self.store
            .latest_price(symbol)?
            .ok_or_else(|| Error::NotFound(format!("no price for {symbol}")))
    }

    /// Compute indicators for one symbol and timeframe and persist the
    /// current snapshot.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] when no candles are stored.
    pub fn technical_report(
        &self,
        symbol: &Symbol,
        timeframe: Timeframe,
        periods: usize,
        now: DateTime<Utc>,
    ) -> Result<TechnicalReport> {
        let required = MIN_REPORT_CANDLES.max(periods * 2);
        let candles = self.store.latest_candles(symbol, timeframe, required)?;
        let Some(last) = candles.last() else {
            return Err(Error::NotFound(format!("no {timeframe} candles for {symbol}")));
        };
        if candles.len() < required {
            debug!(
                symbol = %symbol,
                timeframe = %timeframe,
                candles = candles.len(),
                required,
                "Fewer candles than recommended"
            );
        }

        let series = indicator::compute(&candles, periods);
        let snapshot = series.snapshot();
        let current_price = last.close;

        if !snapshot.is_empty() {
            self.store.save_snapshot(&StoredSnapshot {
                symbol: symbol.clone(),
                timeframe,
                timestamp: last.timestamp,
                snapshot,
            })?;
        }

        let recent = &candles[candles.len().saturating_sub(periods)..];
        let signals = Readings::from_snapshot(&snapshot, current_price);
        debug!(symbol = %symbol, timeframe = %timeframe, overall = ?signals.overall, "Technical report built");

        Ok(TechnicalReport {
            symbol: symbol.clone(),
            symbol_display: symbol.display_name().to_string(),
            timeframe,
            analysis_periods: periods,
            current_price,
            current_indicators: snapshot,
            indicators_timeseries: series,
            recent_volumes: recent
                .iter()
                .map(|c| (c.volume * 100.0).round() / 100.0)
                .collect(),
            recent_candles: recent.to_vec(),
            signals,
            timestamp: now,
        })
    }

    /// Technical reports across several timeframes.
    ///
    /// Timeframes without data are listed as failed; the call only fails
    /// when every timeframe does.
    ///
    /// # Errors
    /// Returns [`Error::NotFound`] when no timeframe has data.
    pub fn multi_timeframe(
        &self,
        symbol: &Symbol,
        timeframes: &[Timeframe],
        periods: usize,
        now: DateTime<Utc>,
    ) -> Result<MultiTimeframeReport> {
        let mut timeframe_data = BTreeMap::new();
        let mut failed = Vec::new();

        for &timeframe in timeframes {
            match self.technical_report(symbol, timeframe, periods, now) {
                Ok(report) => {
                    timeframe_data.insert(timeframe, report);
                }
                Err(Error::NotFound(_)) => failed.push(timeframe),
                Err(e) => return Err(e),
            }
        }

        if timeframe_data.is_empty() {
            return Err(Error::NotFound(format!("no candles for {symbol}")));
        }
        if !failed.is_empty() {
            warn!(symbol = %symbol, failed = ?failed, "Some timeframes have no data");
        }

        Ok(MultiTimeframeReport {
            symbol: symbol.clone(),
            symbol_display: symbol.display_name().to_string(),
            timeframes_used: timeframe_data.keys().copied().collect(),
            failed_timeframes: failed,
            analysis_periods: periods,
            timeframe_data,
            timestamp: now,
        })
    }

    /// Age of the newest candle per timeframe, for one or all active
    /// symbols.
    ///
    /// # Errors
    /// Returns a storage error.
    pub fn freshness(&self, symbol: Option<&Symbol>, now: DateTime<Utc>) -> Result<FreshnessReport> {
        let symbols = match symbol {
            Some(symbol) => vec![symbol.clone()],
            None => self.active_symbols(),
        };

        let mut out = BTreeMap::new();
        for symbol in symbols {
            let mut per_timeframe = BTreeMap::new();
            for &timeframe in &self.timeframes {
                let last = self.store.last_candle_time(&symbol, timeframe)?;
                per_timeframe.insert(timeframe, TimeframeFreshness::assess(timeframe, last, now));
            }
            out.insert(symbol, per_timeframe);
        }

        Ok(FreshnessReport {
            symbols: out,
            timestamp: now,
        })
    }

    /// Recompute and persist indicators for `symbols` on `timeframes`.
    ///
    /// Symbols without data are counted as failed but not listed in
    /// `errors`.
    pub fn refresh(
        &self,
        symbols: &[Symbol],
        timeframes: &[Timeframe],
        now: DateTime<Utc>,
    ) -> RefreshReport {
        let mut report = RefreshReport::default();
        for symbol in symbols {
            let entry = report.results.entry(symbol.clone()).or_default();
            for &timeframe in timeframes {
                let outcome = match self.technical_report(symbol, timeframe, self.default_periods, now) {
                    Ok(r) => {
                        report.refreshed += 1;
                        format!("ok ({:?})", r.signals.overall)
                    }
                    Err(Error::NotFound(reason)) => {
                        report.failed += 1;
                        debug!(symbol = %symbol, timeframe = %timeframe, reason = %reason, "Refresh skipped");
                        format!("not found: {reason}")
                    }
                    Err(e) => {
                        report.failed += 1;
                        warn!(symbol = %symbol, timeframe = %timeframe, error = %e, "Refresh failed");
                        report.errors.push(format!("{symbol} {timeframe}: {e}"));
                        e.to_string()
                    }
                };
                entry.insert(timeframe, outcome);
            }
        }
        info!(
            refreshed = report.refreshed,
            failed = report.failed,
            "Indicator refresh complete"
        );
        report
    }
}

fn dedup(symbols: Vec<Symbol>) -> Vec<Symbol> {
    let mut out: Vec<Symbol> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        if !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryStore;
    use crate::domain::Stance;
    use crate::testkit::domain::{base_time, trending_candles};
    use chrono::Duration;

    fn sol() -> Symbol {
        Symbol::default_symbol()
    }

    fn service() -> (Arc<MemoryStore>, MarketService) {
        let store = Arc::new(MemoryStore::new());
        let svc = MarketService::new(
            store.clone(),
            vec![sol()],
            Timeframe::COLLECTED.to_vec(),
            50,
        );
        (store, svc)
    }

    #[test]
    fn ingest_rejects_whole_batch_on_bad_candle() {
        let (_, svc) = service();
        let mut candles = trending_candles(5, 100.0, 1.0);
        candles[3].high = 0.0;
        let err = svc.ingest_candles(&sol(), Timeframe::M5, candles).unwrap_err();
        assert!(matches!(err, Error::Domain(DomainError::InvalidCandle { .. })));
        assert!(svc.latest_candles(&sol(), Timeframe::M5, 10).unwrap().is_empty());
    }

    #[test]
    fn ingest_sorts_and_dedupes() {
        let (_, svc) = service();
        let mut candles = trending_candles(5, 100.0, 1.0);
        candles.reverse();
        candles.push(candles[0].clone());
        let report = svc.ingest_candles(&sol(), Timeframe::M5, candles).unwrap();
        assert_eq!(report.received, 6);
        assert_eq!(report.stored, 5);

        let stored = svc.latest_candles(&sol(), Timeframe::M5, 10).unwrap();
        assert!(stored.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn ingest_keeps_last_duplicate_in_batch() {
        let (_, svc) = service();
        let candles = trending_candles(3, 100.0, 1.0);
        let mut corrected = candles[1].clone();
        corrected.close = corrected.high;
        corrected.volume += 42.0;
        let batch = vec![candles[0].clone(), candles[1].clone(), candles[2].clone(), corrected.clone()];

        let report = svc.ingest_candles(&sol(), Timeframe::M5, batch).unwrap();
        assert_eq!(report.stored, 3);

        let stored = svc.latest_candles(&sol(), Timeframe::M5, 10).unwrap();
        assert_eq!(stored[1], corrected);
    }

    #[test]
    fn technical_report_persists_snapshot() {
        let (store, svc) = service();
        svc.ingest_candles(&sol(), Timeframe::H1, trending_candles(120, 100.0, 0.5))
            .unwrap();

        let report = svc
            .technical_report(&sol(), Timeframe::H1, 50, Utc::now())
            .unwrap();
        assert_eq!(report.indicators_timeseries.rsi_14.len(), 50);
        assert_eq!(report.recent_candles.len(), 50);
        assert_eq!(report.symbol_display, "Solana");
        assert_eq!(report.signals.ma_trend, Some(crate::domain::indicator::Trend::Bullish));
        assert_ne!(report.signals.overall, Stance::StrongSell);

        let saved = store.latest_snapshot(&sol(), Timeframe::H1).unwrap().unwrap();
        assert_eq!(saved.snapshot, report.current_indicators);
        assert_eq!(saved.timestamp, report.recent_candles.last().unwrap().timestamp);
    }

    #[test]
    fn technical_report_without_data_is_not_found() {
        let (_, svc) = service();
        let err = svc
            .technical_report(&sol(), Timeframe::M5, 50, Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn multi_timeframe_lists_failures() {
        let (_, svc) = service();
        svc.ingest_candles(&sol(), Timeframe::M15, trending_candles(80, 100.0, 0.5))
            .unwrap();
        let report = svc
            .multi_timeframe(&sol(), &[Timeframe::M5, Timeframe::M15], 30, Utc::now())
            .unwrap();
        assert_eq!(report.timeframes_used, vec![Timeframe::M15]);
        assert_eq!(report.failed_timeframes, vec![Timeframe::M5]);
    }

    #[test]
    fn freshness_grades_by_interval() {
        let last = base_time();
        let fresh = TimeframeFreshness::assess(Timeframe::M5, Some(last), last + Duration::minutes(10));
        assert_eq!(fresh.status, FreshnessStatus::Fresh);
        let stale = TimeframeFreshness::assess(Timeframe::M5, Some(last), last + Duration::minutes(25));
        assert_eq!(stale.status, FreshnessStatus::Stale);
        let old = TimeframeFreshness::assess(Timeframe::M5, Some(last), last + Duration::minutes(31));
        assert_eq!(old.status, FreshnessStatus::Old);
        assert_eq!(old.age_minutes, Some(31.0));
        let none = TimeframeFreshness::assess(Timeframe::H1, None, last);
        assert_eq!(none.status, FreshnessStatus::NoData);
    }

    #[test]
    fn freshness_covers_active_symbols() {
        let (_, svc) = service();
        let report = svc.freshness(None, Utc::now()).unwrap();
        let sol_entry = &report.symbols[&sol()];
        assert_eq!(sol_entry.len(), 3);
        assert!(sol_entry.values().all(|f| f.status == FreshnessStatus::NoData));
    }

    #[test]
    fn active_symbols_replace_and_validate() {
        let (_, svc) = service();
        let btc = Symbol::normalize("BTC").unwrap();
        let set = svc
            .set_active_symbols(vec![btc.clone(), btc.clone(), sol()])
            .unwrap();
        assert_eq!(set, vec![btc, sol()]);
        assert!(svc.set_active_symbols(Vec::new()).is_err());
    }

    #[test]
    fn known_symbols_merges_stored_and_active() {
        let (_, svc) = service();
        let eth = Symbol::normalize("ETH").unwrap();
        svc.ingest_candles(&eth, Timeframe::M5, trending_candles(3, 10.0, 1.0))
            .unwrap();
        let known = svc.known_symbols().unwrap();
        assert_eq!(known.len(), 2);
        let eth_info = known.iter().find(|i| i.symbol == eth).unwrap();
        assert!(eth_info.has_data);
        assert!(!eth_info.collecting);
        assert_eq!(eth_info.display_name, "Ethereum");
    }

    #[test]
    fn refresh_counts_outcomes() {
        let (_, svc) = service();
        svc.ingest_candles(&sol(), Timeframe::M5, trending_candles(120, 100.0, 0.5))
            .unwrap();
        let report = svc.refresh(&[sol()], &Timeframe::COLLECTED, Utc::now());
        assert_eq!(report.refreshed, 1);
        assert_eq!(report.failed, 2);
        assert!(report.errors.is_empty());
        assert!(report.results[&sol()][&Timeframe::M5].starts_with("ok"));
    }

    #[test]
    fn latest_price_not_found() {
        let (_, svc) = service();
        assert!(matches!(svc.latest_price(&sol()), Err(Error::NotFound(_))));
    }
}
