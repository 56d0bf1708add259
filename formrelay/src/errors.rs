use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

use crate::api::models::submissions::SubmissionOutcome;

#[derive(ThisError, Debug)]
pub enum Error {
    /// One or more of the required form fields is absent or empty
    #[error("Missing required fields: {}", missing.join(", "))]
    MissingFields { missing: Vec<&'static str> },

    /// The form backend answered with a non-success status
    #[error("{backend} rejected submission with HTTP {status}: {body}")]
    Upstream { backend: &'static str, status: u16, body: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingFields { .. } => StatusCode::BAD_REQUEST,
            Error::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking upstream bodies or internal details
    pub fn user_message(&self) -> String {
        match self {
            Error::MissingFields { .. } => "Missing required fields".to_string(),
            Error::Upstream { backend, .. } => format!("Failed to submit to {backend}"),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match &self {
            Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Upstream { .. } => {
                tracing::error!("Backend error: {}", self);
            }
            Error::MissingFields { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        (status, Json(SubmissionOutcome::failure(self.user_message()))).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
