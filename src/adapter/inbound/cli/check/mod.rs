//! Diagnostic commands.

pub mod config;
pub mod health;
