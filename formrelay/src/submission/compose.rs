use crate::storage::PhotoUploadSummary;

/// Build the message forwarded to the backend: the user's text, unchanged, plus what happened to
/// the photos.
///
/// - uploaded photos are listed one URL per line under `Photos:`
/// - photos that could not be stored at all are mentioned in a short note
/// - when at least one photo made it, failures of the others are not mentioned
pub fn compose_message(message: &str, photos: &PhotoUploadSummary) -> String {
    if photos.submitted == 0 {
        return message.to_string();
    }

    let mut composed = message.to_string();

    if !photos.uploaded.is_empty() {
        composed.push_str("\n\nPhotos:");
        for record in &photos.uploaded {
            composed.push('\n');
            composed.push_str(&record.public_url);
        }
    } else if !photos.storage_configured {
        composed.push_str(&format!(
            "\n\n[{} attached but photo storage is not configured]",
            photo_noun(photos.submitted)
        ));
    } else {
        composed.push_str(&format!(
            "\n\n[{} attached but could not be uploaded]",
            photo_noun(photos.submitted)
        ));
    }

    composed
}

fn photo_noun(count: usize) -> String {
    if count == 1 {
        "1 photo was".to_string()
    } else {
        format!("{count} photos were")
    }
}
