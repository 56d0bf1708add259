//! Photo storage for form attachments.
//!
//! [`ObjectStore`] is the put-object seam to the bucket that actually holds the bytes
//! ([`s3::S3ObjectStore`] in production, [`local::LocalObjectStore`] for development).
//! [`PhotoStore`] sits on top of it and owns the naming policy: keys are
//! `<prefix>/<unix-millis>-<filename>` and public URLs are the configured base URL with the
//! key appended.
//!
//! Uploads are best-effort. A failed photo is logged and left out of the
//! [`PhotoUploadSummary`]; it never fails the submission.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::future::join_all;
use metrics::counter;
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

use crate::config::StorageConfig;
use crate::submission::PhotoUpload;

pub mod local;
pub mod s3;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 put_object failed: {0}")]
    S3(String),

    #[error("{0}")]
    Other(String),
}

/// Trait for object storage backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `content` under `key` with the given content type
    async fn put(&self, key: &str, content: Bytes, content_type: &str) -> Result<()>;
}

/// Record of a photo that made it into storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedPhotoRecord {
    pub storage_key: String,
    pub public_url: String,
}

/// What happened to the photos of one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoUploadSummary {
    /// Non-empty photos the client sent
    pub submitted: usize,
    /// Successful uploads, in submission order
    pub uploaded: Vec<UploadedPhotoRecord>,
    /// Whether a storage backend was available at all
    pub storage_configured: bool,
}

impl PhotoUploadSummary {
    /// Summary for a deployment without photo storage
    pub fn storage_unavailable(submitted: usize) -> Self {
        Self {
            submitted,
            uploaded: Vec::new(),
            storage_configured: false,
        }
    }

    pub fn photo_count(&self) -> usize {
        self.uploaded.len()
    }
}

/// Naming policy plus the object store the photos go to.
pub struct PhotoStore {
    store: Arc<dyn ObjectStore>,
    key_prefix: String,
    public_base_url: Url,
}

impl PhotoStore {
    pub fn new(store: Arc<dyn ObjectStore>, key_prefix: impl Into<String>, public_base_url: Url) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
            public_base_url,
        }
    }

    /// Storage key for a photo: `<prefix>/<millis>-<filename>`.
    pub fn photo_key(&self, timestamp_millis: i64, file_name: &str) -> String {
        format!(
            "{}/{}-{}",
            self.key_prefix.trim_matches('/'),
            timestamp_millis,
            sanitize_file_name(file_name)
        )
    }

    /// Public URL of a stored object. Key segments are percent-encoded.
    pub fn public_url(&self, key: &str) -> String {
        let mut url = self.public_base_url.clone();
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments.pop_if_empty().extend(key.split('/'));
            }
            Err(()) => {
                return format!("{}/{}", self.public_base_url.as_str().trim_end_matches('/'), key);
            }
        }
        url.to_string()
    }

    /// Upload every non-empty photo concurrently. The summary keeps submission order.
    #[tracing::instrument(skip_all, fields(photos = photos.len()))]
    pub async fn upload_all(&self, photos: &[PhotoUpload]) -> PhotoUploadSummary {
        let timestamp = Utc::now().timestamp_millis();
        let photos: Vec<&PhotoUpload> = photos.iter().filter(|photo| !photo.is_empty()).collect();

        let mut used_keys = HashSet::new();
        let keyed: Vec<(String, &PhotoUpload)> = photos
            .iter()
            .enumerate()
            .map(|(index, photo)| {
                let mut key = self.photo_key(timestamp, &photo.file_name);
                // Same filename twice in one request
                let mut attempt = 0;
                while !used_keys.insert(key.clone()) {
                    let suffixed = match attempt {
                        0 => format!("{}-{}", index, photo.file_name),
                        n => format!("{}-{}-{}", index, n, photo.file_name),
                    };
                    key = self.photo_key(timestamp, &suffixed);
                    attempt += 1;
                }
                (key, *photo)
            })
            .collect();

        let results = join_all(keyed.into_iter().map(|(key, photo)| async move {
            let result = self.store.put(&key, photo.content.clone(), &photo.content_type).await;
            (key, photo, result)
        }))
        .await;

        let mut uploaded = Vec::with_capacity(results.len());
        for (key, photo, result) in results {
            match result {
                Ok(()) => {
                    counter!("formrelay_photo_uploads_total", "outcome" => "success").increment(1);
                    tracing::debug!(key = %key, size = photo.len(), content_type = %photo.content_type, "Uploaded photo");
                    uploaded.push(UploadedPhotoRecord {
                        public_url: self.public_url(&key),
                        storage_key: key,
                    });
                }
                Err(e) => {
                    counter!("formrelay_photo_uploads_total", "outcome" => "failure").increment(1);
                    tracing::warn!(key = %key, file_name = %photo.file_name, error = %e, "Photo upload failed, skipping");
                }
            }
        }

        PhotoUploadSummary {
            submitted: photos.len(),
            uploaded,
            storage_configured: true,
        }
    }
}

/// Keep the client filename but never let it introduce extra path segments.
fn sanitize_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "photo".to_string()
    } else {
        cleaned
    }
}

/// Create the photo store described by configuration, or `None` when storage is not configured
pub async fn create_photo_store(config: Option<&StorageConfig>) -> Result<Option<PhotoStore>> {
    let Some(config) = config else {
        tracing::info!("No photo storage configured, attachments will be dropped");
        return Ok(None);
    };

    let store: Arc<dyn ObjectStore> = match config {
        StorageConfig::S3(s3_config) => {
            tracing::info!(bucket = %s3_config.bucket, "Creating S3 photo storage");
            Arc::new(s3::S3ObjectStore::from_config(s3_config).await)
        }
        StorageConfig::Local(local_config) => {
            tracing::info!("Creating local photo storage backend (path: {:?})", local_config.path);
            tokio::fs::create_dir_all(&local_config.path).await.map_err(|e| {
                StorageError::Other(format!(
                    "Failed to create local storage directory {:?}: {}",
                    local_config.path, e
                ))
            })?;
            Arc::new(local::LocalObjectStore::new(local_config.path.clone()))
        }
    };

    Ok(Some(PhotoStore::new(
        store,
        config.key_prefix(),
        config.public_base_url().clone(),
    )))
}
