//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `FORMRELAY_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `FORMRELAY_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `FORMRELAY_BACKEND__API_KEY=fbk_...` sets the `backend.api_key` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use formrelay::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration Structure
//!
//! - **Server**: `host`, `port` - HTTP server binding configuration
//! - **Backend**: `backend.type` (`formbricks` or `formspree`) plus provider credentials
//! - **Storage**: `storage.type` (`s3` or `local`) - optional, photos are dropped when absent
//! - **CORS**: `cors.allow_origin`, `cors.max_age`
//! - **Limits**: `limits.max_body_size` - upper bound for a whole multipart submission
//! - **Features**: `enable_metrics`, `enable_otel_export` - Optional feature toggles
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Override server port
//! FORMRELAY_PORT=8080
//!
//! # Switch to Formspree
//! FORMRELAY_BACKEND__TYPE=formspree
//! FORMRELAY_BACKEND__ENDPOINT=https://formspree.io/f/abcdwxyz
//!
//! # Keep secrets out of the YAML file
//! FORMRELAY_BACKEND__API_KEY=fbk_secret
//! ```

use axum::http::HeaderValue;
use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "FORMRELAY_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults; the backend credentials still have to be provided before
/// [`Config::validate`] accepts the result.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Third-party form backend that receives every accepted submission
    pub backend: BackendConfig,
    /// Timeout for the single outbound backend call
    #[serde(with = "humantime_serde")]
    pub backend_timeout: Duration,
    /// Optional object storage for photo attachments
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,
    /// CORS headers sent to browsers posting the form
    pub cors: CorsConfig,
    /// Request size limits
    pub limits: LimitsConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// Form backend configuration, selected by `type`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Formbricks client responses API
    /// Set credentials via:
    /// - `FORMRELAY_BACKEND__API_KEY`
    /// - `FORMRELAY_BACKEND__ENVIRONMENT_ID`
    Formbricks(FormbricksConfig),
    /// Formspree form endpoint
    /// - `FORMRELAY_BACKEND__ENDPOINT`
    Formspree(FormspreeConfig),
}

/// Formbricks backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormbricksConfig {
    /// API base URL, `/client/responses` is appended
    #[serde(default = "FormbricksConfig::default_api_url")]
    pub api_url: Url,
    /// Value of the `x-api-key` header
    #[serde(default)]
    pub api_key: String,
    /// Formbricks environment the responses belong to
    #[serde(default)]
    pub environment_id: String,
}

/// Formspree backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormspreeConfig {
    /// Full form endpoint (e.g. `https://formspree.io/f/abcdwxyz`)
    pub endpoint: Url,
    /// Body encoding of the outbound request
    #[serde(default)]
    pub encoding: FormEncoding,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormEncoding {
    #[default]
    Urlencoded,
    Multipart,
}

/// Photo storage configuration, selected by `type`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// S3-compatible bucket (AWS S3, Cloudflare R2, MinIO)
    S3(S3StorageConfig),
    /// Local directory, useful for development
    Local(LocalStorageConfig),
}

/// S3 bucket settings. Credentials come from the standard AWS environment/profile chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct S3StorageConfig {
    pub bucket: String,
    /// Region override, defaults to the AWS provider chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<Url>,
    /// Use path-style addressing (required by MinIO)
    #[serde(default)]
    pub force_path_style: bool,
    /// Public host the bucket is served from; object URLs are `<public_base_url>/<key>`
    pub public_base_url: Url,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

/// Local directory storage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalStorageConfig {
    pub path: PathBuf,
    pub public_base_url: Url,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

/// CORS configuration for the submission route.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Value of `Access-Control-Allow-Origin`
    pub allow_origin: String,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum size of a submission body in bytes, photos included
    pub max_body_size: usize,
}

fn default_key_prefix() -> String {
    "repair-photos".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            backend: BackendConfig::default(),
            backend_timeout: Duration::from_secs(30),
            storage: None,
            cors: CorsConfig::default(),
            limits: LimitsConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Formbricks(FormbricksConfig {
            api_url: FormbricksConfig::default_api_url(),
            api_key: String::new(),
            environment_id: String::new(),
        })
    }
}

impl FormbricksConfig {
    fn default_api_url() -> Url {
        Url::parse("https://app.formbricks.com/api/v1").expect("static URL is valid")
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            max_age: None,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 25 * 1024 * 1024,
        }
    }
}

impl StorageConfig {
    pub fn key_prefix(&self) -> &str {
        match self {
            StorageConfig::S3(s3) => &s3.key_prefix,
            StorageConfig::Local(local) => &local.key_prefix,
        }
    }

    pub fn public_base_url(&self) -> &Url {
        match self {
            StorageConfig::S3(s3) => &s3.public_base_url,
            StorageConfig::Local(local) => &local.public_base_url,
        }
    }
}

fn ensure_http(url: &Url, field: &str) -> Result<(), Error> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::Internal {
            operation: format!("Config validation: {field} must be an http(s) URL, got '{url}'"),
        });
    }
    Ok(())
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        match &self.backend {
            BackendConfig::Formbricks(formbricks) => {
                ensure_http(&formbricks.api_url, "backend.api_url")?;
                if formbricks.api_key.trim().is_empty() {
                    return Err(Error::Internal {
                        operation: "Config validation: Formbricks backend requires api_key. \
                         Please set FORMRELAY_BACKEND__API_KEY or add backend.api_key to the config file."
                            .to_string(),
                    });
                }
                if formbricks.environment_id.trim().is_empty() {
                    return Err(Error::Internal {
                        operation: "Config validation: Formbricks backend requires environment_id.".to_string(),
                    });
                }
            }
            BackendConfig::Formspree(formspree) => {
                ensure_http(&formspree.endpoint, "backend.endpoint")?;
            }
        }

        if self.backend_timeout < Duration::from_secs(1) {
            return Err(Error::Internal {
                operation: "Config validation: backend_timeout is too short (minimum 1s)".to_string(),
            });
        }

        if let Some(storage) = &self.storage {
            ensure_http(storage.public_base_url(), "storage.public_base_url")?;
            if storage.key_prefix().trim_matches('/').is_empty() {
                return Err(Error::Internal {
                    operation: "Config validation: storage.key_prefix cannot be empty".to_string(),
                });
            }
            if let StorageConfig::S3(s3) = storage {
                if s3.bucket.trim().is_empty() {
                    return Err(Error::Internal {
                        operation: "Config validation: storage.bucket cannot be empty".to_string(),
                    });
                }
                if let Some(endpoint) = &s3.endpoint_url {
                    ensure_http(endpoint, "storage.endpoint_url")?;
                }
            }
        }

        if HeaderValue::from_str(&self.cors.allow_origin).is_err() || self.cors.allow_origin.is_empty() {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: cors.allow_origin '{}' is not a valid header value",
                    self.cors.allow_origin
                ),
            });
        }

        if self.limits.max_body_size == 0 {
            return Err(Error::Internal {
                operation: "Config validation: limits.max_body_size cannot be 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables override specific values; FORMRELAY_CONFIG names the file itself
            .merge(Env::prefixed("FORMRELAY_").ignore(&["config"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
