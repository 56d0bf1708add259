//! Formspree backend
//!
//! Posts the four fields straight to the form endpoint, either URL-encoded or as multipart
//! form data. `Accept: application/json` makes Formspree answer with a status code instead of
//! redirecting to its thank-you page.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart;

use super::{BackendError, FormBackend, OutboundSubmission, check_response};
use crate::config::{FormEncoding, FormspreeConfig};

pub struct FormspreeBackend {
    config: FormspreeConfig,
    http_client: reqwest::Client,
}

impl FormspreeBackend {
    pub fn new(config: FormspreeConfig, http_client: reqwest::Client) -> Self {
        Self { config, http_client }
    }
}

#[async_trait]
impl FormBackend for FormspreeBackend {
    fn name(&self) -> &'static str {
        "Formspree"
    }

    async fn submit(&self, submission: &OutboundSubmission) -> Result<(), BackendError> {
        let request = self
            .http_client
            .post(self.config.endpoint.clone())
            .header(ACCEPT, "application/json");

        let request = match self.config.encoding {
            FormEncoding::Urlencoded => request.form(submission),
            FormEncoding::Multipart => request.multipart(
                multipart::Form::new()
                    .text("name", submission.name.clone())
                    .text("email", submission.email.clone())
                    .text("device", submission.device.clone())
                    .text("message", submission.message.clone()),
            ),
        };

        tracing::debug!(endpoint = %self.config.endpoint, encoding = ?self.config.encoding, "Submitting form to Formspree");

        let response = request.send().await?;
        check_response(response).await
    }
}
