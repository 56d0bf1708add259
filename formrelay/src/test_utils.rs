//! Test utilities shared by the unit and handler tests.

use async_trait::async_trait;
use axum_test::TestServer;
use axum_test::multipart::MultipartForm;
use bytes::Bytes;
use std::sync::{Arc, Mutex};
use wiremock::MockServer;

use crate::backends::{BackendError, FormBackend, OutboundSubmission, create_backend};
use crate::config::{BackendConfig, Config, FormEncoding, FormbricksConfig, FormspreeConfig};
use crate::storage::{self, ObjectStore, PhotoStore};
use crate::submission::{PhotoUpload, SubmissionRequest};
use crate::{AppState, build_router};

/// reqwest is built without a default crypto provider; install one once per test process.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

pub fn formbricks_config(mock_server: &MockServer) -> FormbricksConfig {
    FormbricksConfig {
        api_url: format!("{}/api/v1", mock_server.uri()).parse().unwrap(),
        api_key: "fbk_test".to_string(),
        environment_id: "env_test".to_string(),
    }
}

pub fn formspree_config(mock_server: &MockServer, encoding: FormEncoding) -> FormspreeConfig {
    FormspreeConfig {
        endpoint: format!("{}/f/test-form", mock_server.uri()).parse().unwrap(),
        encoding,
    }
}

pub fn test_config(backend: BackendConfig) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        backend,
        ..Default::default()
    }
}

pub fn outbound(message: &str) -> OutboundSubmission {
    OutboundSubmission {
        name: "Jane".to_string(),
        email: "jane@x.com".to_string(),
        device: "iPhone 12".to_string(),
        message: message.to_string(),
    }
}

pub fn photo(file_name: &str, content_type: &str, content: &[u8]) -> PhotoUpload {
    PhotoUpload {
        file_name: file_name.to_string(),
        content_type: content_type.to_string(),
        content: Bytes::copy_from_slice(content),
    }
}

pub fn submission_request(photos: Vec<PhotoUpload>) -> SubmissionRequest {
    SubmissionRequest {
        name: "Jane".to_string(),
        email: "jane@x.com".to_string(),
        device: "iPhone 12".to_string(),
        message: "Screen cracked".to_string(),
        photos,
    }
}

/// The example form from the docs: Jane's cracked iPhone 12 screen.
pub fn contact_form() -> MultipartForm {
    MultipartForm::new()
        .add_text("name", "Jane")
        .add_text("email", "jane@x.com")
        .add_text("device", "iPhone 12")
        .add_text("message", "Screen cracked")
}

#[derive(Debug, Clone)]
pub struct RecordedPut {
    pub key: String,
    pub content_type: String,
    pub size: usize,
}

/// In-memory object store that records every put and can fail selected filenames.
#[derive(Default)]
pub struct RecordingObjectStore {
    puts: Mutex<Vec<RecordedPut>>,
    failing: Vec<String>,
}

impl RecordingObjectStore {
    pub fn failing_on(file_names: &[&str]) -> Self {
        Self {
            puts: Mutex::default(),
            failing: file_names.iter().map(|name| format!("-{name}")).collect(),
        }
    }

    pub fn puts(&self) -> Vec<RecordedPut> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn put(&self, key: &str, content: Bytes, content_type: &str) -> storage::Result<()> {
        if self.failing.iter().any(|suffix| key.ends_with(suffix)) {
            return Err(storage::StorageError::Other(format!("simulated failure for {key}")));
        }
        self.puts.lock().unwrap().push(RecordedPut {
            key: key.to_string(),
            content_type: content_type.to_string(),
            size: content.len(),
        });
        Ok(())
    }
}

pub fn photo_store(objects: Arc<RecordingObjectStore>) -> PhotoStore {
    PhotoStore::new(objects, "repair-photos", "https://photos.example.com".parse().unwrap())
}

/// Backend double that records submissions and answers with a fixed result.
#[derive(Default)]
pub struct RecordingBackend {
    submissions: Mutex<Vec<OutboundSubmission>>,
    reject_with: Option<(u16, String)>,
}

impl RecordingBackend {
    pub fn rejecting(status: u16, body: &str) -> Self {
        Self {
            submissions: Mutex::default(),
            reject_with: Some((status, body.to_string())),
        }
    }

    pub fn submissions(&self) -> Vec<OutboundSubmission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl FormBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "Recording"
    }

    async fn submit(&self, submission: &OutboundSubmission) -> Result<(), BackendError> {
        self.submissions.lock().unwrap().push(submission.clone());
        match &self.reject_with {
            Some((status, body)) => Err(BackendError::Rejected {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn state_for(backend_config: BackendConfig, photos: Option<PhotoStore>) -> AppState {
    install_crypto_provider();
    let backend = create_backend(&backend_config, reqwest::Client::new());
    AppState::builder()
        .config(test_config(backend_config))
        .backend(backend)
        .maybe_photos(photos.map(Arc::new))
        .build()
}

pub fn formspree_state(mock_server: &MockServer, encoding: FormEncoding, photos: Option<PhotoStore>) -> AppState {
    state_for(BackendConfig::Formspree(formspree_config(mock_server, encoding)), photos)
}

pub fn formbricks_state(mock_server: &MockServer) -> AppState {
    state_for(BackendConfig::Formbricks(formbricks_config(mock_server)), None)
}

pub fn create_test_app(state: AppState) -> TestServer {
    let router = build_router(&state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}
