//! Grading recorded analyses against later prices.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::domain::analysis::change_pct;
use crate::domain::{AnalysisRecord, NewAnalysis, Outcome, Recommendation, Symbol, Verification};
use crate::error::Result;
use crate::port::{AnalysisStore, MarketStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifiedAnalysis {
    pub id: i64,
    pub symbol: Symbol,
    pub recommendation: Recommendation,
    pub entry_price: f64,
    pub current_price: f64,
    pub change_pct: f64,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VerificationReport {
    pub verified: usize,
    pub success: usize,
    pub failure: usize,
    /// Pending analyses skipped because their symbol has no price yet.
    pub skipped: usize,
    pub details: Vec<VerifiedAnalysis>,
}

pub struct VerificationService {
    analyses: Arc<dyn AnalysisStore>,
    market: Arc<dyn MarketStore>,
    delay: Duration,
    hold_tolerance_pct: f64,
}

impl VerificationService {
    #[must_use]
    pub fn new(
        analyses: Arc<dyn AnalysisStore>,
        market: Arc<dyn MarketStore>,
        delay: Duration,
        hold_tolerance_pct: f64,
    ) -> Self {
        Self {
            analyses,
            market,
            delay,
            hold_tolerance_pct,
        }
    }

    /// Validate and store a new analysis.
    ///
    /// # Errors
    /// Returns a domain error for out-of-range values or a storage error.
    pub fn record(&self, analysis: &NewAnalysis, now: DateTime<Utc>) -> Result<AnalysisRecord> {
        analysis.validate()?;
        let record = self.analyses.record(analysis, now)?;
        info!(
            id = record.id,
            symbol = %record.symbol,
            recommendation = %record.recommendation,
            confidence = record.confidence,
            "Analysis recorded"
        );
        Ok(record)
    }

    /// # Errors
    /// Returns a storage error.
    pub fn history(&self, symbol: Option<&Symbol>, limit: usize) -> Result<Vec<AnalysisRecord>> {
        self.analyses.history(symbol, limit)
    }

    /// Grade every analysis older than the verification delay.
    ///
    /// # Errors
    /// Returns a storage error when pending analyses cannot be listed.
    /// Failures on individual analyses are logged and skipped.
    pub fn run(&self, now: DateTime<Utc>) -> Result<VerificationReport> {
        let pending = self.analyses.pending(now - self.delay)?;
        let mut report = VerificationReport::default();

        for analysis in pending {
            let tick = match self.market.latest_price(&analysis.symbol) {
                Ok(Some(tick)) => tick,
                Ok(None) => {
                    debug!(id = analysis.id, symbol = %analysis.symbol, "No price to verify against");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(id = analysis.id, error = %e, "Price lookup failed");
                    report.skipped += 1;
                    continue;
                }
            };

            let outcome = analysis.grade(tick.price, self.hold_tolerance_pct);
            let verification = Verification {
                outcome,
                price: tick.price,
                change_pct: change_pct(analysis.entry_price, tick.price),
                verified_at: now,
            };
            if let Err(e) = self.analyses.record_verification(analysis.id, &verification) {
                warn!(id = analysis.id, error = %e, "Failed to store verification");
                continue;
            }

            report.verified += 1;
            match outcome {
                Outcome::Success => report.success += 1,
                Outcome::Failure => report.failure += 1,
            }
            report.details.push(VerifiedAnalysis {
                id: analysis.id,
                symbol: analysis.symbol,
                recommendation: analysis.recommendation,
                entry_price: analysis.entry_price,
                current_price: tick.price,
                change_pct: verification.change_pct,
                outcome,
            });
        }

        if report.verified > 0 {
            info!(
                verified = report.verified,
                success = report.success,
                failure = report.failure,
                "Analyses verified"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::memory::MemoryStore;
    use crate::domain::PriceTick;

    fn new_analysis(symbol: &Symbol, rec: Recommendation, entry: f64) -> NewAnalysis {
        NewAnalysis {
            symbol: symbol.clone(),
            agent_name: Some("momentum".to_string()),
            recommendation: rec,
            confidence: 0.8,
            analysis: "test".to_string(),
            entry_price: entry,
            target_price: None,
            stop_loss: None,
        }
    }

    fn setup() -> (Arc<MemoryStore>, VerificationService) {
        let store = Arc::new(MemoryStore::new());
        let svc = VerificationService::new(store.clone(), store.clone(), Duration::minutes(15), 2.0);
        (store, svc)
    }

    #[test]
    fn only_old_enough_analyses_are_graded() {
        let (store, svc) = setup();
        let sol = Symbol::default_symbol();
        let now = Utc::now();

        svc.record(&new_analysis(&sol, Recommendation::Buy, 100.0), now - Duration::minutes(20))
            .unwrap();
        svc.record(&new_analysis(&sol, Recommendation::Sell, 100.0), now - Duration::minutes(5))
            .unwrap();
        store
            .insert_price(&PriceTick::try_new(sol.clone(), 103.0, 0.0, 0.0, now).unwrap())
            .unwrap();

        let report = svc.run(now).unwrap();
        assert_eq!(report.verified, 1);
        assert_eq!(report.success, 1);
        assert_eq!(report.details[0].recommendation, Recommendation::Buy);
        assert!((report.details[0].change_pct - 3.0).abs() < 1e-9);

        // Already verified analyses are not graded twice.
        let again = svc.run(now).unwrap();
        assert_eq!(again.verified, 0);

        let history = svc.history(Some(&sol), 10).unwrap();
        let graded = history.iter().find(|a| a.recommendation == Recommendation::Buy).unwrap();
        assert_eq!(graded.verification.as_ref().unwrap().outcome, Outcome::Success);
    }

    #[test]
    fn missing_price_is_skipped() {
        let (_, svc) = setup();
        let now = Utc::now();
        svc.record(
            &new_analysis(&Symbol::default_symbol(), Recommendation::Hold, 50.0),
            now - Duration::hours(1),
        )
        .unwrap();
        let report = svc.run(now).unwrap();
        assert_eq!(report.verified, 0);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn record_validates_confidence() {
        let (_, svc) = setup();
        let mut analysis = new_analysis(&Symbol::default_symbol(), Recommendation::Buy, 10.0);
        analysis.confidence = 2.0;
        assert!(svc.record(&analysis, Utc::now()).is_err());
    }
}
