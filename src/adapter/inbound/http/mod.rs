//! JSON HTTP API.

pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use router::router;
pub use server::serve;
pub use state::AppState;
