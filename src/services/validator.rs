use crate::error::AppError;
use crate::models::file_types::{CandidateFile, Rejection, Validation};
use crate::models::notification_types::Severity;
use crate::services::notifier::NotificationSink;
use tracing::warn;

pub const ACCEPTED_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];
pub const MAX_FILE_BYTES: u64 = 16 * 1024 * 1024;

/// Type is checked before size; a file reports at most one reason.
pub fn validate(file: &CandidateFile) -> Validation {
    if !ACCEPTED_MEDIA_TYPES.contains(&file.media_type()) {
        return Validation::Rejected(Rejection::UnsupportedType {
            media_type: file.media_type().to_string(),
        });
    }

    if file.size_bytes() > MAX_FILE_BYTES {
        return Validation::Rejected(Rejection::TooLarge {
            name: file.name().to_string(),
            size_bytes: file.size_bytes(),
        });
    }

    Validation::Accepted
}

/// Validate every file in the batch, notifying once per rejection.
/// Accepted files come back in input order.
pub fn filter_batch(files: Vec<CandidateFile>, sink: &NotificationSink) -> Vec<CandidateFile> {
    files
        .into_iter()
        .filter(|file| match validate(file) {
            Validation::Accepted => true,
            Validation::Rejected(reason) => {
                warn!(file = %file.name(), ?reason, "Rejected candidate file");
                sink.notify(AppError::from(reason).message(), Severity::Error);
                false
            }
        })
        .collect()
}
