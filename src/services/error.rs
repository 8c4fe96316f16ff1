use thiserror::Error;

use crate::application::error::UploadError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Destination name already taken: {0}")]
    NameTaken(String),

    #[error("Invalid destination name: {0}")]
    InvalidName(String),

    #[error("Pending write already finished")]
    AlreadyFinished,

    #[error("I/O error while {action}: {source}")]
    Io {
        action: String,
        source: std::io::Error,
    },
}

impl StorageError {
    pub fn io(action: impl Into<String>) -> impl FnOnce(std::io::Error) -> StorageError {
        let action = action.into();
        move |source| StorageError::Io { action, source }
    }
}

impl From<StorageError> for UploadError {
    fn from(error: StorageError) -> Self {
        UploadError::StorageFailure(error.to_string())
    }
}
