//! Contact form submissions.
//!
//! A submission moves through three stages within a single request:
//!
//! ```text
//! multipart body ──parse──▶ SubmissionForm ──validate──▶ SubmissionRequest ──relay──▶ SubmissionOutcome
//!                                                              │
//!                                              photos ──▶ PhotoStore (best-effort)
//!                                              message ─▶ compose_message ─▶ FormBackend (once)
//! ```
//!
//! Nothing here outlives the request.

use axum::extract::Multipart;
use bytes::Bytes;

use crate::errors::{Error, Result};

mod compose;
mod relay;

pub use compose::compose_message;
pub use relay::relay;

/// Default content type for parts that do not declare one
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A file part of the `photos` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub content: Bytes,
}

impl PhotoUpload {
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Raw form fields as received, before validation.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub device: Option<String>,
    pub message: Option<String>,
    pub photos: Vec<PhotoUpload>,
}

/// A submission with all required fields present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub name: String,
    pub email: String,
    pub device: String,
    pub message: String,
    pub photos: Vec<PhotoUpload>,
}

impl SubmissionForm {
    /// Read every part of a multipart body. The first occurrence of a text field wins,
    /// unknown fields are ignored.
    pub async fn from_multipart(multipart: &mut Multipart) -> Result<Self> {
        let mut form = SubmissionForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Error::Other(anyhow::anyhow!("Failed to parse multipart data: {}", e)))?
        {
            let field_name = field.name().unwrap_or("").to_string();

            let slot = match field_name.as_str() {
                "name" => &mut form.name,
                "email" => &mut form.email,
                "device" => &mut form.device,
                "message" => &mut form.message,
                "photos" => {
                    let file_name = field.file_name().unwrap_or("").to_string();
                    let content_type = field.content_type().unwrap_or(DEFAULT_CONTENT_TYPE).to_string();
                    let content = field
                        .bytes()
                        .await
                        .map_err(|e| Error::Other(anyhow::anyhow!("Failed to read photo '{}': {}", file_name, e)))?;

                    tracing::debug!(file_name = %file_name, size = content.len(), "Received photo part");
                    form.photos.push(PhotoUpload {
                        file_name,
                        content_type,
                        content,
                    });
                    continue;
                }
                other => {
                    tracing::trace!(field = %other, "Ignoring unknown form field");
                    continue;
                }
            };

            let value = field
                .text()
                .await
                .map_err(|e| Error::Other(anyhow::anyhow!("Failed to read field '{}': {}", field_name, e)))?;
            if slot.is_none() {
                *slot = Some(value);
            }
        }

        Ok(form)
    }

    /// Check that `name`, `email`, `device` and `message` are present and not empty.
    pub fn validate(self) -> Result<SubmissionRequest> {
        fn present(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|v| !v.is_empty())
        }

        let missing: Vec<&'static str> = [
            ("name", &self.name),
            ("email", &self.email),
            ("device", &self.device),
            ("message", &self.message),
        ]
        .into_iter()
        .filter(|(_, value)| !present(value))
        .map(|(field, _)| field)
        .collect();

        match (self.name, self.email, self.device, self.message) {
            (Some(name), Some(email), Some(device), Some(message)) if missing.is_empty() => Ok(SubmissionRequest {
                name,
                email,
                device,
                message,
                photos: self.photos,
            }),
            _ => Err(Error::MissingFields { missing }),
        }
    }
}
