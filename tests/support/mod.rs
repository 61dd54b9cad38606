#![allow(dead_code)]

pub mod server;

use std::sync::Arc;

use solbot::infrastructure::bootstrap::Services;
use solbot::infrastructure::config::settings::Config;
use solbot::testkit;
use tempfile::TempDir;

/// Config rooted in a fresh temporary directory.
pub fn temp_config() -> (TempDir, Config) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = testkit::config::in_dir(dir.path());
    (dir, config)
}

/// SQLite-backed services over a temporary data directory.
pub fn sqlite_services() -> (TempDir, Arc<Services>) {
    let (dir, config) = temp_config();
    let services = Services::open(config).expect("open services");
    (dir, Arc::new(services))
}
