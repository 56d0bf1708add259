//! # formrelay: contact form relay for repair requests
//!
//! `formrelay` receives the repair request form of a website (name, email, device, message and
//! optional photos), uploads the photos to object storage and forwards the submission to a
//! hosted form backend such as Formbricks or Formspree. It keeps no state of its own: every
//! request is validated, relayed and answered within its own lifetime, and the backend is the
//! only place submissions are persisted.
//!
//! ## Request Flow
//!
//! A browser first sends an `OPTIONS /submit-contact` preflight, answered directly with the CORS
//! headers. The actual `POST /submit-contact` carries a multipart body. The handler parses it into
//! a [`submission::SubmissionForm`], rejects it with `400` when a required field is missing, and
//! otherwise hands it to [`submission::relay`]. Photos are uploaded concurrently through the
//! configured [`storage::PhotoStore`]; failures are logged and skipped. The message is then
//! extended with the photo URLs and sent to the [`backends::FormBackend`] exactly once. A
//! non-success answer from the backend becomes a `500`. Every response is JSON with a `success`
//! flag and carries `Access-Control-Allow-Origin`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use formrelay::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = formrelay::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     formrelay::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod backends;
pub mod config;
pub mod errors;
mod openapi;
pub mod storage;
pub mod submission;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, header};
use axum::{
    Json, Router,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::backends::FormBackend;
use crate::openapi::ApiDoc;
use crate::storage::PhotoStore;

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .backend(backend)
///     .maybe_photos(photos)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    /// Third-party service every accepted submission is forwarded to
    pub backend: Arc<dyn FormBackend>,
    /// Photo storage; `None` when no bucket is configured
    pub photos: Option<Arc<PhotoStore>>,
}

/// Build the application router with all endpoints and middleware.
///
/// - `POST/OPTIONS /submit-contact`
/// - `/healthz`, API docs at `/docs`
/// - Optional Prometheus metrics at `/internal/metrics`
/// - `Access-Control-Allow-Origin` on every response
/// - Tracing middleware
///
/// # Errors
///
/// Returns an error if the configured CORS origin is not a valid header value.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let allow_origin = HeaderValue::from_str(&state.config.cors.allow_origin)?;

    let submission_routes = Router::new()
        .route(
            "/submit-contact",
            post(api::handlers::submissions::submit_contact).options(api::handlers::submissions::preflight),
        )
        .layer(DefaultBodyLimit::max(state.config.limits.max_body_size));

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(submission_routes)
        .with_state(state.clone())
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    // Add Prometheus metrics if enabled
    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    // Browsers need the origin header on errors and preflights alike
    let router = router.layer(SetResponseHeaderLayer::if_not_present(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        allow_origin,
    ));

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// The relay process: configuration plus the router serving it.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting form relay with configuration: {:#?}", config);

        let http_client = reqwest::Client::builder()
            .timeout(config.backend_timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create backend HTTP client: {}", e))?;
        let backend = backends::create_backend(&config.backend, http_client);
        info!("Forwarding submissions to {}", backend.name());

        let photos = storage::create_photo_store(config.storage.as_ref())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize photo storage: {}", e))?;

        let app_state = AppState::builder()
            .config(config.clone())
            .backend(backend)
            .maybe_photos(photos.map(Arc::new))
            .build();

        let router = build_router(&app_state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Form relay listening on http://{}, available at http://localhost:{}",
            bind_addr,
            listener.local_addr()?.port()
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
