//! Runtime health reporting.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::port::MarketStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    name: &'static str,
    critical: bool,
    status: HealthStatus,
}

impl HealthCheck {
    fn from_result(name: &'static str, critical: bool, result: Result<(), String>) -> Self {
        Self {
            name,
            critical,
            status: match result {
                Ok(()) => HealthStatus::Healthy,
                Err(reason) => HealthStatus::Unhealthy(reason),
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn critical(&self) -> bool {
        self.critical
    }

    pub fn status(&self) -> &HealthStatus {
        &self.status
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthStatus::Healthy)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    checks: Vec<HealthCheck>,
}

impl HealthReport {
    pub fn checks(&self) -> &[HealthCheck] {
        &self.checks
    }

    pub fn is_healthy(&self) -> bool {
        self.checks
            .iter()
            .filter(|check| check.critical())
            .all(HealthCheck::is_healthy)
    }
}

/// What the health check inspects.
pub struct HealthProbe<'a> {
    pub store: &'a dyn MarketStore,
    pub data_dir: &'a Path,
    pub log_dir: &'a Path,
    pub active_symbols: usize,
    pub scheduler_running: bool,
}

pub fn health_check(probe: &HealthProbe<'_>) -> HealthReport {
    let checks = vec![
        HealthCheck::from_result(
            "database",
            true,
            probe.store.ping().map_err(|e| e.to_string()),
        ),
        HealthCheck::from_result("data_dir", true, writable(probe.data_dir)),
        HealthCheck::from_result("log_dir", false, writable(probe.log_dir)),
        HealthCheck::from_result(
            "symbols",
            true,
            if probe.active_symbols == 0 {
                Err("no active symbols".to_string())
            } else {
                Ok(())
            },
        ),
        HealthCheck::from_result(
            "scheduler",
            false,
            if probe.scheduler_running {
                Ok(())
            } else {
                Err("scheduler is stopped".to_string())
            },
        ),
    ];
    HealthReport { checks }
}

fn writable(dir: &Path) -> Result<(), String> {
    if !dir.is_dir() {
        return Err(format!("{} does not exist", dir.display()));
    }
    let probe = dir.join(".health_probe");
    fs::write(&probe, b"ok").map_err(|e| format!("{} is not writable: {e}", dir.display()))?;
    let _ = fs::remove_file(&probe);
    Ok(())
}
