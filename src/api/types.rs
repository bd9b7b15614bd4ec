//! Shared state for the front-end router.

use crate::backend::{BackendError, ImageBackendClient};
use crate::config::ServiceConfig;

/// Shared context for all front-end routes.
#[derive(Clone)]
pub struct ApiContext {
    pub backend: ImageBackendClient,
    pub body_limit_bytes: usize,
}

impl ApiContext {
    pub fn new(backend: ImageBackendClient, body_limit_bytes: usize) -> Self {
        Self {
            backend,
            body_limit_bytes,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, BackendError> {
        let backend = ImageBackendClient::new(&config.backend_url, config.request_timeout)?;
        Ok(Self::new(backend, config.body_limit_bytes))
    }
}
