//! Formbricks backend
//!
//! Submissions are created through the client responses API:
//! `POST <api_url>/client/responses` with the `x-api-key` header. The submitter's email doubles
//! as the Formbricks `userId`.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use super::{BackendError, FormBackend, OutboundSubmission, check_response};
use crate::config::FormbricksConfig;

pub struct FormbricksBackend {
    config: FormbricksConfig,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePayload<'a> {
    environment_id: &'a str,
    user_id: &'a str,
    finished: bool,
    data: ResponseData<'a>,
}

#[derive(Debug, Serialize)]
struct ResponseData<'a> {
    name: &'a str,
    email: &'a str,
    device: &'a str,
    message: &'a str,
    timestamp: String,
}

impl FormbricksBackend {
    pub fn new(config: FormbricksConfig, http_client: reqwest::Client) -> Self {
        Self { config, http_client }
    }

    fn responses_url(&self) -> String {
        format!("{}/client/responses", self.config.api_url.as_str().trim_end_matches('/'))
    }
}

#[async_trait]
impl FormBackend for FormbricksBackend {
    fn name(&self) -> &'static str {
        "Formbricks"
    }

    async fn submit(&self, submission: &OutboundSubmission) -> Result<(), BackendError> {
        let payload = ResponsePayload {
            environment_id: &self.config.environment_id,
            user_id: &submission.email,
            finished: true,
            data: ResponseData {
                name: &submission.name,
                email: &submission.email,
                device: &submission.device,
                message: &submission.message,
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            },
        };

        tracing::debug!(url = %self.responses_url(), "Submitting response to Formbricks");

        let response = self
            .http_client
            .post(self.responses_url())
            .header("x-api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        check_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{formbricks_config, install_crypto_provider, outbound};
    use serde_json::Value;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_submit_posts_client_response() {
        install_crypto_provider();
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/client/responses"))
            .and(header("x-api-key", "fbk_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": {"id": "resp_1"}})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let backend = FormbricksBackend::new(formbricks_config(&mock_server), reqwest::Client::new());
        backend.submit(&outbound("Screen cracked")).await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["environmentId"], "env_test");
        assert_eq!(body["userId"], "jane@x.com");
        assert_eq!(body["finished"], true);
        assert_eq!(body["data"]["name"], "Jane");
        assert_eq!(body["data"]["device"], "iPhone 12");
        assert_eq!(body["data"]["message"], "Screen cracked");
        let timestamp = body["data"]["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[tokio::test]
    async fn test_submit_reports_rejection_with_body() {
        install_crypto_provider();
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let backend = FormbricksBackend::new(formbricks_config(&mock_server), reqwest::Client::new());
        let result = backend.submit(&outbound("hello")).await;

        match result {
            Err(BackendError::Rejected { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_network_error_is_transport_error() {
        install_crypto_provider();
        let mut config = formbricks_config(&MockServer::start().await);
        // Point to a port that's not listening
        config.api_url = "http://127.0.0.1:1/api/v1".parse().unwrap();

        let backend = FormbricksBackend::new(config, reqwest::Client::new());
        let result = backend.submit(&outbound("hello")).await;

        assert!(matches!(result, Err(BackendError::Transport(_))));
    }
}
