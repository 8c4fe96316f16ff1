use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    Extension, Json,
};
use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::{
    adapters::{dto::file_dto::UploadLogoResponse, state::AppState},
    application::error::{ApplicationError, UploadError},
    domain::{
        config::upload_policy::UploadPolicy,
        models::{auth::Claims, file::IncomingFile},
    },
};

/// Multipart field carrying the logo file.
pub const LOGO_FIELD: &str = "logo";

const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

pub struct UploadController;

impl UploadController {
    /// POST /api/v1/uploads/company-logos
    /// Multipart body with the file in the `logo` field. Fields before it are skipped;
    /// nothing after it is read.
    pub async fn upload_company_logo(
        State(app_state): State<AppState>,
        claims: Option<Extension<Claims>>,
        mut multipart: Multipart,
    ) -> Result<(StatusCode, Json<UploadLogoResponse>), ApplicationError> {
        let uploader = claims.map(|Extension(claims)| claims.id);
        info!("Logo upload requested by {:?}", uploader);

        let service = &app_state.upload_service;
        let mut response: Option<UploadLogoResponse> = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| multipart_error(e, service.policy()))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name != LOGO_FIELD {
                debug!("Ignoring multipart field '{}'", name);
                continue;
            }
            let declared_mime_type = field.content_type().unwrap_or(UNKNOWN_MIME_TYPE).to_string();
            let original_name = field.file_name().unwrap_or("").to_string();
            // Some clients send a per-part length; it lets oversized files fail before streaming
            let size_hint = field
                .headers()
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let policy = service.policy().clone();
            let content = field.map(move |chunk| chunk.map_err(|e| multipart_error(e, &policy)));

            let mut incoming = IncomingFile::new(declared_mime_type, original_name, content);
            if let Some(size_hint) = size_hint {
                incoming = incoming.with_size_hint(size_hint);
            }

            let stored = service.accept(incoming).await?;
            debug!(
                "Stored logo {} with extension {:?}",
                stored.final_name,
                stored.extension()
            );
            response = Some(UploadLogoResponse::new(stored, &app_state.public_base_url));
            // The rest of the body is never read, so it cannot fail a stored upload
            break;
        }

        let response = response.ok_or_else(|| {
            warn!("Missing required '{}' field in upload", LOGO_FIELD);
            ApplicationError::BadRequest(format!("Missing required field '{}'", LOGO_FIELD))
        })?;

        info!("Logo stored at {}", response.path);
        Ok((StatusCode::CREATED, Json(response)))
    }
}

/// Body-limit overruns surface as multipart errors; they are size rejections.
fn multipart_error(error: MultipartError, policy: &UploadPolicy) -> ApplicationError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return UploadError::too_large(policy).into();
    }
    warn!("Invalid multipart data: {}", error);
    ApplicationError::BadRequest("Invalid request format".to_string())
}
