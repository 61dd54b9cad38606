//! SQLite persistence adapters.
//!
//! Provides the SQLite-backed [`SqliteStore`](store::SqliteStore)
//! implementing both store ports with Diesel ORM.

pub mod database;
pub mod store;

pub use store::SqliteStore;
