//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from an optional TOML file, then `SOLBOT_*`
//! environment variables override individual fields. A missing file is not
//! an error: every field has a default suited to the container layout.
//!
//! # Example
//!
//! ```no_run
//! use solbot::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::logging::LoggingConfig;
use crate::domain::symbol::{self, Symbol, DEFAULT_SYMBOL};
use crate::domain::Timeframe;
use crate::error::{ConfigError, Result};

/// Name of the SQLite file created under the data directory.
pub const DATABASE_FILE: &str = "trading_bot.db";

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the API listens on.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Persistent storage locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    /// Explicit database path. Defaults to `<data_dir>/trading_bot.db`.
    pub database: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            database: None,
        }
    }
}

impl StorageConfig {
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DATABASE_FILE))
    }
}

/// Tracked symbols and timeframes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Raw symbol spellings; normalized during validation.
    pub symbols: Vec<String>,
    pub default_symbol: String,
    /// Timeframes covered by refresh and freshness reports.
    pub timeframes: Vec<Timeframe>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            symbols: vec![DEFAULT_SYMBOL.to_string()],
            default_symbol: DEFAULT_SYMBOL.to_string(),
            timeframes: Timeframe::COLLECTED.to_vec(),
        }
    }
}

/// Background job settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Start the scheduler together with the server.
    pub autostart: bool,
    /// Minimum age of an analysis before it is graded.
    pub verification_delay_minutes: u64,
    /// Quiet period per symbol after a detection.
    pub signal_cooldown_minutes: u64,
    pub signal_timeframe: Timeframe,
    /// How often the loop checks the clock. Below 60 so no minute slot is
    /// skipped.
    pub tick_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            autostart: true,
            verification_delay_minutes: 15,
            signal_cooldown_minutes: 60,
            signal_timeframe: Timeframe::M5,
            tick_seconds: 10,
        }
    }
}

/// Technical analysis and grading settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Length of returned indicator series.
    pub default_periods: usize,
    /// Price band within which a HOLD counts as correct, in percent.
    pub hold_tolerance_pct: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_periods: 50,
            hold_tolerance_pct: crate::domain::analysis::DEFAULT_HOLD_TOLERANCE_PCT,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    pub market: MarketConfig,
    pub scheduler: SchedulerConfig,
    pub analysis: AnalysisConfig,
}

impl Config {
    /// Parse configuration from TOML content and apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed, an override cannot be
    /// parsed, or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_with(content, |key| std::env::var(key).ok())
    }

    /// Like [`parse_toml`](Self::parse_toml) with an explicit variable
    /// lookup.
    ///
    /// # Errors
    ///
    /// See [`parse_toml`](Self::parse_toml).
    #[allow(clippy::result_large_err)]
    pub fn parse_with(content: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, the content
    /// is malformed, or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = if path.exists() {
            std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?
        } else {
            String::new()
        };
        Self::parse_toml(&content)
    }

    /// Apply `SOLBOT_*` overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable cannot be
    /// parsed into its field.
    #[allow(clippy::result_large_err)]
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(bind) = lookup("SOLBOT_BIND") {
            self.server.bind = bind;
        }
        if let Some(dir) = lookup("SOLBOT_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(db) = lookup("SOLBOT_DATABASE") {
            self.storage.database = Some(PathBuf::from(db));
        }
        if let Some(dir) = lookup("SOLBOT_LOG_DIR") {
            self.logging.directory = PathBuf::from(dir);
        }
        if let Some(level) = lookup("SOLBOT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("SOLBOT_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Some(symbols) = lookup("SOLBOT_SYMBOLS") {
            self.market.symbols = symbols
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(raw) = lookup("SOLBOT_SCHEDULER_AUTOSTART") {
            self.scheduler.autostart = parse_bool(&raw).ok_or(ConfigError::InvalidValue {
                field: "SOLBOT_SCHEDULER_AUTOSTART",
                reason: format!("expected true or false, got '{raw}'"),
            })?;
        }
        Ok(())
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "bind" }.into());
        }
        self.bind_addr()?;

        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingField { field: "data_dir" }.into());
        }
        if self.storage.database_path().as_os_str().is_empty() {
            return Err(ConfigError::MissingField { field: "database" }.into());
        }

        self.symbols()?;
        self.default_symbol()?;
        if self.market.timeframes.is_empty() {
            return Err(ConfigError::MissingField { field: "timeframes" }.into());
        }

        if self.scheduler.verification_delay_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "verification_delay_minutes",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if !(1..60).contains(&self.scheduler.tick_seconds) {
            return Err(ConfigError::InvalidValue {
                field: "tick_seconds",
                reason: "must be between 1 and 59".to_string(),
            }
            .into());
        }

        let tolerance = self.analysis.hold_tolerance_pct;
        if !(tolerance > 0.0 && tolerance <= 100.0) {
            return Err(ConfigError::InvalidValue {
                field: "hold_tolerance_pct",
                reason: "must be within (0, 100]".to_string(),
            }
            .into());
        }
        if !(5..=500).contains(&self.analysis.default_periods) {
            return Err(ConfigError::InvalidValue {
                field: "default_periods",
                reason: "must be between 5 and 500".to_string(),
            }
            .into());
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "format",
                reason: format!("expected pretty or json, got '{}'", self.logging.format),
            }
            .into());
        }
        Ok(())
    }

    /// The parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when `server.bind` is not a
    /// socket address.
    #[allow(clippy::result_large_err)]
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidValue {
                field: "bind",
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Normalized, de-duplicated active symbols.
    ///
    /// # Errors
    ///
    /// Returns an error when the list is empty or a symbol is malformed.
    #[allow(clippy::result_large_err)]
    pub fn symbols(&self) -> Result<Vec<Symbol>> {
        let symbols = symbol::parse_list(&self.market.symbols.join(",")).map_err(|e| {
            ConfigError::InvalidValue {
                field: "symbols",
                reason: e.to_string(),
            }
        })?;
        if symbols.is_empty() {
            return Err(ConfigError::MissingField { field: "symbols" }.into());
        }
        Ok(symbols)
    }

    /// # Errors
    ///
    /// Returns an error when `market.default_symbol` is malformed.
    #[allow(clippy::result_large_err)]
    pub fn default_symbol(&self) -> Result<Symbol> {
        Symbol::normalize(&self.market.default_symbol).map_err(|e| {
            ConfigError::InvalidValue {
                field: "default_symbol",
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
