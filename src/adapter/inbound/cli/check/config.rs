use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;

/// Load and validate configuration without starting the service.
pub fn execute_config(path: &Path) -> Result<()> {
    let config = Config::load(path)?;
    let symbols = config.symbols()?;
    let symbol_list = symbols
        .iter()
        .map(|s| s.as_str().to_string())
        .collect::<Vec<_>>();
    let timeframes = config
        .market
        .timeframes
        .iter()
        .map(|tf| tf.as_str().to_string())
        .collect::<Vec<_>>();

    if output::is_json() {
        output::json_output(json!({
            "command": "check.config",
            "valid": true,
            "config": path.display().to_string(),
            "file_present": path.exists(),
            "bind": config.server.bind,
            "data_dir": config.storage.data_dir,
            "database": config.storage.database_path(),
            "log_dir": config.logging.directory,
            "symbols": symbol_list,
            "timeframes": timeframes,
            "scheduler_autostart": config.scheduler.autostart,
        }));
        return Ok(());
    }

    output::section("Configuration Check");
    output::field("Config", path.display());
    if !path.exists() {
        output::warning("Config file not found, using defaults and environment");
    }
    output::field("Bind", &config.server.bind);
    output::field("Data dir", config.storage.data_dir.display());
    output::field("Database", config.storage.database_path().display());
    output::field("Log dir", config.logging.directory.display());
    output::field("Symbols", symbol_list.join(", "));
    output::field("Timeframes", timeframes.join(", "));
    output::field("Signals on", config.scheduler.signal_timeframe);
    output::field("Autostart", config.scheduler.autostart);
    output::success("Configuration is valid");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_file_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[market]\nsymbols = [\"SOL/USDT\", \"ETHUSDT\"]\n").unwrap();
        assert!(execute_config(&path).is_ok());
    }

    #[test]
    fn malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[analysis]\nhold_tolerance_pct = 0.0\n").unwrap();
        assert!(execute_config(&path).is_err());
    }
}
