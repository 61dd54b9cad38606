//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! business logic. This layer handles configuration, wiring, scheduling and
//! process lifecycle.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`orchestration`] - Health reporting and job scheduling
//! - [`shutdown`] - Process signal handling

pub mod bootstrap;
pub mod config;
pub mod orchestration;
pub mod shutdown;
