//! HTTP handlers for the contact form endpoint.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use metrics::counter;

use crate::AppState;
use crate::api::models::submissions::SubmissionOutcome;
use crate::errors::{Error, Result};
use crate::submission::{self, SubmissionForm};

#[utoipa::path(
    post,
    path = "/submit-contact",
    tag = "submissions",
    summary = "Submit repair request",
    description = "Accepts the contact form as multipart data. `name`, `email`, `device` and `message` are required; \
any number of `photos` file parts may be attached. Photos are uploaded on a best-effort basis and linked in the \
message forwarded to the form backend.",
    request_body(
        content_type = "multipart/form-data",
        description = "Form fields name, email, device, message and optional photos"
    ),
    responses(
        (status = 200, description = "Submission forwarded", body = SubmissionOutcome),
        (status = 400, description = "A required field is missing", body = SubmissionOutcome),
        (status = 500, description = "The form backend rejected the submission or the request could not be processed", body = SubmissionOutcome)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn submit_contact(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<SubmissionOutcome>> {
    let result = handle_submission(&state, multipart).await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(Error::MissingFields { .. }) => "invalid",
        Err(Error::Upstream { .. }) => "rejected",
        Err(_) => "error",
    };
    counter!("formrelay_submissions_total", "outcome" => outcome).increment(1);

    result.map(Json)
}

async fn handle_submission(
    state: &AppState,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<SubmissionOutcome> {
    let mut multipart = multipart.map_err(|e| Error::Other(anyhow::anyhow!("Invalid multipart request: {}", e)))?;

    let request = SubmissionForm::from_multipart(&mut multipart).await?.validate()?;

    submission::relay(state.backend.as_ref(), state.photos.as_deref(), request).await
}

#[utoipa::path(
    options,
    path = "/submit-contact",
    tag = "submissions",
    summary = "CORS preflight",
    description = "Answers browser preflight requests for the submission endpoint.",
    responses(
        (status = 204, description = "Preflight accepted; CORS headers are set")
    )
)]
pub async fn preflight(State(state): State<AppState>) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST, OPTIONS"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));
    if let Some(max_age) = state.config.cors.max_age {
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from(max_age));
    }

    (StatusCode::NO_CONTENT, headers)
}
