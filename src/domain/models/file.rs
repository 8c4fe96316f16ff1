use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One upload attempt as it arrives from the transport. The content stream is
/// consumed exactly once: the file is either stored or discarded.
pub struct IncomingFile<S> {
    pub declared_mime_type: String,
    pub original_name: String,
    pub size_hint: Option<u64>,
    pub content: S,
}

impl<S> IncomingFile<S> {
    pub fn new(declared_mime_type: String, original_name: String, content: S) -> Self {
        Self {
            declared_mime_type,
            original_name,
            size_hint: None,
            content,
        }
    }

    pub fn with_size_hint(mut self, size_hint: u64) -> Self {
        self.size_hint = Some(size_hint);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    #[serde(rename = "finalName")]
    pub final_name: String,
    pub path: PathBuf,
    #[serde(rename = "sizeBytes")]
    pub size_bytes: u64,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "storedAt")]
    pub stored_at: DateTime<Utc>,
}

impl StoredFile {
    pub fn extension(&self) -> Option<&str> {
        self.final_name.rsplit_once('.').map(|(_, extension)| extension)
    }
}
