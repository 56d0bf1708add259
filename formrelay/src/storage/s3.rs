//! S3-compatible object storage (AWS S3, Cloudflare R2, MinIO).

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{Client, config::Region, error::DisplayErrorContext, primitives::ByteStream};
use bytes::Bytes;

use super::{ObjectStore, Result, StorageError};
use crate::config::S3StorageConfig;

pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the AWS provider chain plus the overrides in `config`.
    pub async fn from_config(config: &S3StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared_config = loader.load().await;

        let client_config = apply_overrides(aws_sdk_s3::config::Builder::from(&shared_config), config);
        Self::new(Client::from_conf(client_config), config.bucket.clone())
    }
}

/// Endpoint and addressing overrides for S3-compatible services
fn apply_overrides(builder: aws_sdk_s3::config::Builder, config: &S3StorageConfig) -> aws_sdk_s3::Config {
    let mut builder = builder.force_path_style(config.force_path_style);
    if let Some(endpoint) = &config.endpoint_url {
        builder = builder.endpoint_url(endpoint.as_str().trim_end_matches('/'));
    }
    builder.build()
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, content: Bytes, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(content))
            .send()
            .await
            .map_err(|e| StorageError::S3(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::install_crypto_provider;
    use aws_sdk_s3::config::Credentials;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(mock_server: &MockServer) -> S3ObjectStore {
        let config = S3StorageConfig {
            bucket: "repair-bucket".to_string(),
            region: Some("us-east-1".to_string()),
            endpoint_url: Some(mock_server.uri().parse().unwrap()),
            force_path_style: true,
            public_base_url: "https://photos.example.com".parse().unwrap(),
            key_prefix: "repair-photos".to_string(),
        };
        let builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"));

        S3ObjectStore::new(Client::from_conf(apply_overrides(builder, &config)), config.bucket)
    }

    #[tokio::test]
    async fn test_put_uses_path_style_bucket_and_content_type() {
        install_crypto_provider();
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repair-bucket/repair-photos/1700000000123-screen.jpg"))
            .and(header("content-type", "image/jpeg"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let store = store_for(&mock_server);
        store
            .put(
                "repair-photos/1700000000123-screen.jpg",
                Bytes::from_static(b"jpeg bytes"),
                "image/jpeg",
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_put_rejection_is_storage_error() {
        install_crypto_provider();
        let mock_server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                r#"<?xml version="1.0" encoding="UTF-8"?><Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>"#,
            ))
            .mount(&mock_server)
            .await;

        let store = store_for(&mock_server);
        let result = store
            .put("repair-photos/1-a.png", Bytes::from_static(b"png"), "image/png")
            .await;

        assert!(matches!(result, Err(StorageError::S3(_))));
    }
}
