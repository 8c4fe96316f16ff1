use thiserror::Error;

use crate::domain::config::upload_policy::{human_size, UploadPolicy};

#[derive(Debug)]
pub enum ApplicationError {
    BadRequest(String),
    Unauthorized,
    Upload(UploadError),
}

impl From<UploadError> for ApplicationError {
    fn from(error: UploadError) -> Self {
        ApplicationError::Upload(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadErrorKind {
    InvalidType,
    TooLarge,
    StorageFailure,
}

/// Terminal outcome of a rejected upload attempt.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("MIME type '{declared}' is not accepted")]
    InvalidType {
        declared: String,
        accepted_types: Vec<String>,
        accepted_extensions: Vec<String>,
    },

    #[error("Upload exceeds the {max_bytes} byte limit")]
    TooLarge { max_bytes: u64 },

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl UploadError {
    pub fn invalid_type(declared: &str, policy: &UploadPolicy) -> Self {
        UploadError::InvalidType {
            declared: declared.to_string(),
            accepted_types: policy.accepted_mime_types(),
            accepted_extensions: policy.accepted_extensions(),
        }
    }

    pub fn too_large(policy: &UploadPolicy) -> Self {
        UploadError::TooLarge {
            max_bytes: policy.max_bytes(),
        }
    }

    pub fn kind(&self) -> UploadErrorKind {
        match self {
            UploadError::InvalidType { .. } => UploadErrorKind::InvalidType,
            UploadError::TooLarge { .. } => UploadErrorKind::TooLarge,
            UploadError::StorageFailure(_) => UploadErrorKind::StorageFailure,
        }
    }

    /// Message returned to the client. Storage details stay in the logs.
    pub fn message(&self) -> String {
        match self {
            UploadError::InvalidType {
                accepted_types,
                accepted_extensions,
                ..
            } => format!(
                "Invalid file type. Allowed types are: {} ({})",
                accepted_types.join(", "),
                accepted_extensions.join(", ")
            ),
            UploadError::TooLarge { max_bytes } => format!(
                "File size too large. Maximum size is {}",
                human_size(*max_bytes)
            ),
            UploadError::StorageFailure(_) => "Failed to store uploaded file".to_string(),
        }
    }
}
