//! Response model for the contact form submission endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome reported back to the browser after a submission attempt.
///
/// Successful submissions carry `message` and `photoCount`; failures carry `error` only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of photos that were uploaded and linked in the forwarded message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_count: Option<usize>,
}

impl SubmissionOutcome {
    pub fn success(photo_count: usize) -> Self {
        Self {
            success: true,
            message: Some("Form submitted successfully".to_string()),
            error: None,
            photo_count: Some(photo_count),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
            photo_count: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let value = serde_json::to_value(SubmissionOutcome::success(2)).unwrap();
        assert_eq!(
            value,
            json!({"success": true, "message": "Form submitted successfully", "photoCount": 2})
        );
    }

    #[test]
    fn test_failure_shape() {
        let value = serde_json::to_value(SubmissionOutcome::failure("Missing required fields")).unwrap();
        assert_eq!(value, json!({"success": false, "error": "Missing required fields"}));
    }
}
