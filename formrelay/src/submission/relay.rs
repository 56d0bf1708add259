use super::SubmissionRequest;
use super::compose_message;
use crate::api::models::submissions::SubmissionOutcome;
use crate::backends::{FormBackend, OutboundSubmission};
use crate::errors::Result;
use crate::storage::{PhotoStore, PhotoUploadSummary};

/// Upload the photos (if storage is available), compose the message and forward the submission.
///
/// Exactly one backend call is made. Photo failures only change the composed message.
#[tracing::instrument(skip_all, fields(backend = backend.name(), photos = request.photos.len()))]
pub async fn relay(backend: &dyn FormBackend, photos: Option<&PhotoStore>, request: SubmissionRequest) -> Result<SubmissionOutcome> {
    let summary = match photos {
        Some(store) => store.upload_all(&request.photos).await,
        None => {
            let submitted = request.photos.iter().filter(|photo| !photo.is_empty()).count();
            if submitted > 0 {
                tracing::warn!(submitted, "Photos attached but no photo storage is configured");
            }
            PhotoUploadSummary::storage_unavailable(submitted)
        }
    };

    let outbound = OutboundSubmission {
        message: compose_message(&request.message, &summary),
        name: request.name,
        email: request.email,
        device: request.device,
    };

    backend
        .submit(&outbound)
        .await
        .map_err(|e| e.into_error(backend.name()))?;

    tracing::info!(
        photos_submitted = summary.submitted,
        photos_uploaded = summary.photo_count(),
        "Submission forwarded to {}",
        backend.name()
    );

    Ok(SubmissionOutcome::success(summary.photo_count()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::test_utils::{RecordingBackend, RecordingObjectStore, photo, photo_store, submission_request};

    #[tokio::test]
    async fn test_relay_without_photos() {
        let backend = RecordingBackend::default();

        let outcome = relay(&backend, None, submission_request(Vec::new())).await.unwrap();

        assert_eq!(outcome, SubmissionOutcome::success(0));
        let sent = backend.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].name, "Jane");
        assert_eq!(sent[0].message, "Screen cracked");
    }

    #[tokio::test]
    async fn test_relay_lists_uploaded_photos() {
        let backend = RecordingBackend::default();
        let objects = std::sync::Arc::new(RecordingObjectStore::default());
        let store = photo_store(objects.clone());

        let request = submission_request(vec![
            photo("one.jpg", "image/jpeg", b"1"),
            photo("two.jpg", "image/jpeg", b"2"),
            photo("three.jpg", "image/jpeg", b"3"),
        ]);
        let outcome = relay(&backend, Some(&store), request).await.unwrap();

        assert_eq!(outcome.photo_count, Some(3));
        assert_eq!(objects.puts().len(), 3);

        let message = &backend.submissions()[0].message;
        let urls: Vec<&str> = message.lines().skip_while(|line| *line != "Photos:").skip(1).collect();
        assert_eq!(urls.len(), 3);
        assert!(urls[0].ends_with("-one.jpg"));
        assert!(urls[1].ends_with("-two.jpg"));
        assert!(urls[2].ends_with("-three.jpg"));
    }

    #[tokio::test]
    async fn test_relay_without_storage_drops_photos() {
        let backend = RecordingBackend::default();

        let request = submission_request(vec![photo("one.jpg", "image/jpeg", b"1")]);
        let outcome = relay(&backend, None, request).await.unwrap();

        assert_eq!(outcome.photo_count, Some(0));
        let message = &backend.submissions()[0].message;
        assert!(!message.contains("Photos:"));
        assert!(message.contains("photo storage is not configured"));
    }

    #[tokio::test]
    async fn test_relay_all_uploads_failed() {
        let backend = RecordingBackend::default();
        let store = photo_store(std::sync::Arc::new(RecordingObjectStore::failing_on(&["one.jpg"])));

        let request = submission_request(vec![photo("one.jpg", "image/jpeg", b"1")]);
        let outcome = relay(&backend, Some(&store), request).await.unwrap();

        assert_eq!(outcome.photo_count, Some(0));
        assert!(backend.submissions()[0].message.contains("could not be uploaded"));
    }

    #[tokio::test]
    async fn test_relay_upstream_rejection() {
        let backend = RecordingBackend::rejecting(503, "maintenance");

        let result = relay(&backend, None, submission_request(Vec::new())).await;

        match result {
            Err(Error::Upstream { backend, status, body }) => {
                assert_eq!(backend, "Recording");
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
        assert_eq!(backend.submissions().len(), 1);
    }
}
