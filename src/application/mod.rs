//! Application services (use cases).
//!
//! These services orchestrate domain logic over the store ports and are
//! shared by the HTTP API and the scheduler.

pub mod indicator;
pub mod market;
pub mod signal;
pub mod verification;
