//! Shared handler state.

use std::sync::Arc;

use crate::error::Result;
use crate::infrastructure::bootstrap::Services;

use super::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
}

impl AppState {
    #[must_use]
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    /// Run synchronous service work on the blocking pool.
    pub async fn blocking<T, F>(&self, work: F) -> ApiResult<T>
    where
        F: FnOnce(&Services) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let services = Arc::clone(&self.services);
        tokio::task::spawn_blocking(move || work(&services))
            .await
            .map_err(|e| ApiError::internal(e.to_string()))?
            .map_err(ApiError::from)
    }
}
