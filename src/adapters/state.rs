use axum::extract::FromRef;

use crate::{adapters::middleware::TokenVerifier, application::services::UploadService};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub upload_service: UploadService,
    pub token_verifier: Option<TokenVerifier>,
    pub public_base_url: String,
}
