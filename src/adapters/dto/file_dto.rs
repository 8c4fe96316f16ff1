use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{config::server::LOGO_DIRECTORY, models::file::StoredFile};

#[derive(Debug, Serialize)]
pub struct UploadLogoResponse {
    pub message: String,
    pub filename: String,
    pub path: String,
    pub url: String,
    pub size: u64,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: DateTime<Utc>,
}

impl UploadLogoResponse {
    pub fn new(stored: StoredFile, public_base_url: &str) -> Self {
        let path = public_logo_path(&stored.final_name);
        Self {
            message: "Logo uploaded successfully".to_string(),
            url: format!("{}{}", public_base_url.trim_end_matches('/'), path),
            path,
            filename: stored.final_name,
            size: stored.size_bytes,
            mime_type: stored.mime_type,
            uploaded_at: stored.stored_at,
        }
    }
}

pub fn public_logo_path(final_name: &str) -> String {
    format!("/uploads/{}/{}", LOGO_DIRECTORY, final_name)
}
