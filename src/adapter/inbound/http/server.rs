//! HTTP server lifecycle.

use std::future::Future;

use tokio::net::TcpListener;
use tracing::info;

use super::router::router;
use super::state::AppState;
use crate::error::Result;

/// Serve the API on `listener` until `shutdown` resolves.
///
/// # Errors
/// Returns an error if the listener fails while accepting connections.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(address = %addr, "HTTP server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("HTTP server stopped");
    Ok(())
}
