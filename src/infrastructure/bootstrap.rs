//! Composition root: builds stores and services from configuration.

use std::fs;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::adapter::outbound::sqlite::database::connection::{create_pool, run_migrations};
use crate::adapter::outbound::sqlite::SqliteStore;
use crate::application::market::MarketService;
use crate::application::signal::{SignalBoard, SignalDetector};
use crate::application::verification::VerificationService;
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::orchestration::health::{health_check, HealthProbe, HealthReport};
use crate::infrastructure::orchestration::scheduler::{Scheduler, SchedulerSettings};
use crate::port::{AnalysisStore, MarketStore};

/// Every long-lived component of a running service.
pub struct Services {
    pub config: Config,
    pub store: Arc<dyn MarketStore>,
    pub market: Arc<MarketService>,
    pub detector: Arc<SignalDetector>,
    pub board: Arc<SignalBoard>,
    pub verifier: Arc<VerificationService>,
    pub scheduler: Arc<Scheduler>,
    pub started_at: DateTime<Utc>,
}

impl Services {
    /// Create the data and log directories, open the SQLite database and
    /// run migrations.
    ///
    /// # Errors
    /// Returns an error if a directory cannot be created or the database
    /// cannot be opened or migrated.
    pub fn open(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.storage.data_dir)?;
        fs::create_dir_all(&config.logging.directory)?;

        let db_path = config.storage.database_path();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let db_url = db_path.to_str().ok_or(ConfigError::InvalidValue {
            field: "database",
            reason: "path is not valid UTF-8".to_string(),
        })?;

        let pool = create_pool(db_url)?;
        run_migrations(&pool)?;
        info!(database = %db_path.display(), "Database initialized");

        let store = Arc::new(SqliteStore::new(pool));
        Self::with_stores(config, store.clone(), store)
    }

    /// Wire services over the given stores.
    ///
    /// # Errors
    /// Returns an error if the configured symbols are invalid.
    pub fn with_stores(
        config: Config,
        store: Arc<dyn MarketStore>,
        analyses: Arc<dyn AnalysisStore>,
    ) -> Result<Self> {
        let symbols = config.symbols()?;
        let market = Arc::new(MarketService::new(
            Arc::clone(&store),
            symbols,
            config.market.timeframes.clone(),
            config.analysis.default_periods,
        ));
        let detector = Arc::new(SignalDetector::new(
            Arc::clone(&store),
            minutes(config.scheduler.signal_cooldown_minutes),
        ));
        let board = Arc::new(SignalBoard::new());
        let verifier = Arc::new(VerificationService::new(
            analyses,
            Arc::clone(&store),
            minutes(config.scheduler.verification_delay_minutes),
            config.analysis.hold_tolerance_pct,
        ));
        let scheduler = Arc::new(Scheduler::new(
            Arc::clone(&market),
            Arc::clone(&detector),
            Arc::clone(&board),
            Arc::clone(&verifier),
            SchedulerSettings::from(&config.scheduler),
        ));

        Ok(Self {
            config,
            store,
            market,
            detector,
            board,
            verifier,
            scheduler,
            started_at: Utc::now(),
        })
    }

    /// Probe the database, directories, symbols and scheduler.
    #[must_use]
    pub fn health(&self) -> HealthReport {
        health_check(&HealthProbe {
            store: self.store.as_ref(),
            data_dir: &self.config.storage.data_dir,
            log_dir: &self.config.logging.directory,
            active_symbols: self.market.active_symbols().len(),
            scheduler_running: self.scheduler.is_running(),
        })
    }

    #[must_use]
    pub fn uptime(&self, now: DateTime<Utc>) -> Duration {
        now - self.started_at
    }
}

fn minutes(value: u64) -> Duration {
    Duration::minutes(i64::try_from(value).unwrap_or(i64::MAX / 60_000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit;

    #[test]
    fn open_creates_directories_and_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = testkit::config::in_dir(dir.path());
        let services = Services::open(config.clone()).unwrap();

        assert!(config.storage.data_dir.is_dir());
        assert!(config.logging.directory.is_dir());
        assert!(config.storage.database_path().is_file());
        assert!(services.health().is_healthy());
    }

    #[test]
    fn services_share_active_symbols() {
        let services = testkit::config::memory_services();
        assert_eq!(services.market.active_symbols().len(), 1);
        assert!(!services.scheduler.is_running());
    }
}
