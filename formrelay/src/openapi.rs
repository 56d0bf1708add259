//! OpenAPI documentation for the submission endpoint, served at `/api-docs/openapi.json` and
//! rendered at `/docs`.

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "formrelay",
        description = "Relays repair request forms, with optional photos, to a hosted form backend."
    ),
    paths(
        api::handlers::submissions::submit_contact,
        api::handlers::submissions::preflight,
    ),
    components(
        schemas(
            api::models::submissions::SubmissionOutcome,
        )
    ),
    tags(
        (name = "submissions", description = "Contact form submission"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_contains_submission_schema() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components should be generated");
        assert!(components.schemas.contains_key("SubmissionOutcome"));
        assert!(doc.paths.paths.contains_key("/submit-contact"));
    }
}
