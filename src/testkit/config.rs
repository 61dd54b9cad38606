//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use std::path::Path;
use std::sync::Arc;

use crate::adapter::outbound::memory::MemoryStore;
use crate::infrastructure::bootstrap::Services;
use crate::infrastructure::config::settings::Config;

/// Defaults with data and logs under `dir`, bound to an ephemeral
/// loopback port and the scheduler left stopped.
pub fn in_dir(dir: &Path) -> Config {
    let mut config = Config::default();
    config.server.bind = "127.0.0.1:0".to_string();
    config.storage.data_dir = dir.join("data");
    config.logging.directory = dir.join("logs");
    config.scheduler.autostart = false;
    config.scheduler.tick_seconds = 1;
    config
}

/// Services over a fresh [`MemoryStore`] with default configuration.
pub fn memory_services() -> Services {
    let store = Arc::new(MemoryStore::new());
    let mut config = Config::default();
    config.scheduler.autostart = false;
    Services::with_stores(config, store.clone(), store).expect("default config is valid")
}
