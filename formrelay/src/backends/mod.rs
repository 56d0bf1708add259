//! Form backend abstraction layer
//!
//! This module defines the `FormBackend` trait which abstracts the third-party service that
//! finally receives each submission (Formbricks, Formspree).

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use crate::config::BackendConfig;
use crate::errors::Error;

pub mod formbricks;
pub mod formspree;

/// Create a form backend from configuration
///
/// This is the single point where we convert config into backend instances.
/// Adding a new backend requires adding a match arm here.
pub fn create_backend(config: &BackendConfig, http_client: reqwest::Client) -> Arc<dyn FormBackend> {
    match config {
        BackendConfig::Formbricks(formbricks_config) => {
            Arc::new(formbricks::FormbricksBackend::new(formbricks_config.clone(), http_client))
        }
        BackendConfig::Formspree(formspree_config) => {
            Arc::new(formspree::FormspreeBackend::new(formspree_config.clone(), http_client))
        }
    }
}

/// The fields forwarded to the backend. `message` already contains the photo block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundSubmission {
    pub name: String,
    pub email: String,
    pub device: String,
    pub message: String,
}

/// Errors that can occur while forwarding a submission
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend responded with HTTP {status}")]
    Rejected { status: u16, body: String },

    #[error("request to backend failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl BackendError {
    /// Convert into the service error for `backend`
    pub fn into_error(self, backend: &'static str) -> Error {
        match self {
            BackendError::Rejected { status, body } => Error::Upstream { backend, status, body },
            BackendError::Transport(e) => Error::Other(anyhow::Error::new(e).context(format!("Failed to reach {backend}"))),
        }
    }
}

#[async_trait]
pub trait FormBackend: Send + Sync {
    /// Human readable backend name, used in logs and user-facing errors
    fn name(&self) -> &'static str;

    /// Perform exactly one outbound request for `submission`. Never retries.
    async fn submit(&self, submission: &OutboundSubmission) -> Result<(), BackendError>;
}

/// Map a backend response to `Ok` or `BackendError::Rejected`, keeping the body for logs.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<(), BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<failed to read response body: {e}>"));
    Err(BackendError::Rejected {
        status: status.as_u16(),
        body,
    })
}
