//! Terminal output for CLI commands.
//!
//! Text mode prints aligned, colored lines; `--json` mode emits one JSON
//! object per line (`{"type": ..., "payload": ...}`) so scripts can consume
//! the output. `--quiet` suppresses everything except warnings and errors.

use std::fmt::Display;

use owo_colors::{OwoColorize, Stream};
use parking_lot::RwLock;
use serde_json::{json, Value};

use super::command::ColorChoice;

/// Output flags shared by every command.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    pub json: bool,
    pub quiet: bool,
    pub verbose: u8,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool, verbose: u8) -> Self {
        Self {
            json,
            quiet,
            verbose,
        }
    }
}

static OUTPUT: RwLock<OutputConfig> = parking_lot::const_rwlock(OutputConfig::new(false, false, 0));

/// Install the output flags parsed from the command line.
pub fn configure(config: OutputConfig, color: ColorChoice) {
    *OUTPUT.write() = config;
    match color {
        ColorChoice::Auto => owo_colors::unset_override(),
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
    }
}

fn current() -> OutputConfig {
    *OUTPUT.read()
}

#[must_use]
pub fn is_json() -> bool {
    current().json
}

#[must_use]
pub fn is_quiet() -> bool {
    current().quiet
}

#[must_use]
pub fn verbosity() -> u8 {
    current().verbose
}

fn emit(kind: &str, payload: Value) {
    println!("{}", json!({ "type": kind, "payload": payload }));
}

/// Text output is shown unless quiet; JSON output is always shown.
fn text_suppressed(config: OutputConfig) -> bool {
    !config.json && config.quiet
}

/// Print the application name and version.
pub fn header(version: &str) {
    let config = current();
    if config.json {
        emit("header", json!({ "app": "solbot", "version": version }));
        return;
    }
    if text_suppressed(config) {
        return;
    }
    println!(
        "{} {}",
        "solbot".if_supports_color(Stream::Stdout, |t| t.bold()),
        version.if_supports_color(Stream::Stdout, |t| t.dimmed())
    );
    println!();
}

/// Print a section title.
pub fn section(title: &str) {
    let config = current();
    if config.json {
        emit("section", json!({ "title": title }));
        return;
    }
    if text_suppressed(config) {
        return;
    }
    println!();
    println!("{}", title.if_supports_color(Stream::Stdout, |t| t.bold()));
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    let config = current();
    let value = value.to_string();
    if config.json {
        emit("field", json!({ "label": label, "value": value }));
        return;
    }
    if text_suppressed(config) {
        return;
    }
    println!(
        "  {:<14} {}",
        label.if_supports_color(Stream::Stdout, |t| t.dimmed()),
        value
    );
}

pub fn success(message: &str) {
    let config = current();
    if config.json {
        emit("success", json!({ "message": message }));
        return;
    }
    if text_suppressed(config) {
        return;
    }
    println!(
        "  {} {}",
        "✓".if_supports_color(Stream::Stdout, |t| t.green()),
        message
    );
}

pub fn warning(message: &str) {
    if is_json() {
        emit("warning", json!({ "message": message }));
        return;
    }
    println!(
        "  {} {}",
        "⚠".if_supports_color(Stream::Stdout, |t| t.yellow()),
        message
    );
}

/// Print an error line to stderr.
pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", json!({ "type": "error", "payload": { "message": message } }));
        return;
    }
    eprintln!(
        "  {} {}",
        "×".if_supports_color(Stream::Stderr, |t| t.red()),
        message
    );
}

/// Print a complete JSON document (JSON mode only).
pub fn json_output(value: Value) {
    if is_json() {
        println!("{value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_only_suppresses_text() {
        assert!(text_suppressed(OutputConfig::new(false, true, 0)));
        assert!(!text_suppressed(OutputConfig::new(true, true, 0)));
        assert!(!text_suppressed(OutputConfig::default()));
    }
}
