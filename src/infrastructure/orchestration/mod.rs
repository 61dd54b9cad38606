//! Application orchestration.
//!
//! Health reporting and the clock-synchronized job scheduler.

pub mod health;
pub mod scheduler;
