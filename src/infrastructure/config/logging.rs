//! Logging configuration and initialization.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::Deserialize;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// File written under the log directory.
pub const LOG_FILE: &str = "solbot.log";

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    /// Directory receiving [`LOG_FILE`].
    pub directory: PathBuf,
}

impl LoggingConfig {
    #[must_use]
    pub fn file_path(&self) -> PathBuf {
        self.directory.join(LOG_FILE)
    }

    /// Initialize the tracing subscriber with this logging configuration.
    ///
    /// Events go to stdout and are appended to [`file_path`](Self::file_path).
    /// If the file cannot be opened, logging continues on stdout only.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        let json = self.format == "json";

        let stdout = if json {
            fmt::layer().json().boxed()
        } else {
            fmt::layer().boxed()
        };

        let (file_layer, file_error) = match open_append(&self.directory, &self.file_path()) {
            Ok(file) => {
                let writer = Mutex::new(file);
                let layer = if json {
                    fmt::layer().json().with_writer(writer).boxed()
                } else {
                    fmt::layer().with_ansi(false).with_writer(writer).boxed()
                };
                (Some(layer), None)
            }
            Err(e) => (None, Some(e)),
        };

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(stdout)
            .with(file_layer)
            .try_init();

        if let Some(e) = file_error {
            warn!(
                path = %self.file_path().display(),
                error = %e,
                "Log file unavailable, logging to stdout only"
            );
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
            directory: PathBuf::from("./logs"),
        }
    }
}

fn open_append(directory: &Path, path: &Path) -> io::Result<File> {
    fs::create_dir_all(directory)?;
    OpenOptions::new().create(true).append(true).open(path)
}
