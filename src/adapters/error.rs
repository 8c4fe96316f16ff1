use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::application::error::{ApplicationError, UploadError, UploadErrorKind};

/// Every error body carries a `message`, whatever produced it.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug)]
pub struct NormalizedUploadError {
    pub kind: UploadErrorKind,
    pub status: StatusCode,
    pub message: String,
}

impl From<&UploadError> for NormalizedUploadError {
    fn from(error: &UploadError) -> Self {
        match error {
            UploadError::StorageFailure(detail) => error!("Upload storage failure: {}", detail),
            other => warn!("Upload rejected: {}", other),
        }

        let status = match error.kind() {
            UploadErrorKind::InvalidType | UploadErrorKind::TooLarge => StatusCode::BAD_REQUEST,
            UploadErrorKind::StorageFailure => StatusCode::INTERNAL_SERVER_ERROR,
        };

        Self {
            kind: error.kind(),
            status,
            message: error.message(),
        }
    }
}

impl IntoResponse for NormalizedUploadError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                message: self.message,
            }),
        )
            .into_response()
    }
}

/// Converts upload rejections into their response shape. Anything else is handed
/// back untouched for the generic handler.
pub fn normalize_upload_error(
    error: ApplicationError,
) -> Result<NormalizedUploadError, ApplicationError> {
    match error {
        ApplicationError::Upload(upload_error) => Ok(NormalizedUploadError::from(&upload_error)),
        other => Err(other),
    }
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApplicationError::Upload(upload_error) => {
                return NormalizedUploadError::from(&upload_error).into_response();
            }
            ApplicationError::BadRequest(msg) => {
                warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            ApplicationError::Unauthorized => {
                warn!("Unauthorized access attempt");
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::upload_policy::UploadPolicy;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn client_rejections_map_to_400() {
        let policy = UploadPolicy::default();
        for error in [
            UploadError::invalid_type("application/pdf", &policy),
            UploadError::too_large(&policy),
        ] {
            let normalized = normalize_upload_error(error.into()).unwrap();
            assert_eq!(normalized.status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn storage_failure_maps_to_opaque_500() {
        let error = UploadError::StorageFailure("EACCES /srv/uploads/company-logos".to_string());

        let normalized = normalize_upload_error(error.into()).unwrap();

        assert_eq!(normalized.kind, UploadErrorKind::StorageFailure);
        assert_eq!(normalized.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(normalized.message, "Failed to store uploaded file");
    }

    #[test]
    fn other_errors_pass_through_unchanged() {
        let passed = normalize_upload_error(ApplicationError::BadRequest("nope".to_string()));
        assert!(matches!(passed, Err(ApplicationError::BadRequest(ref m)) if m == "nope"));

        let passed = normalize_upload_error(ApplicationError::Unauthorized);
        assert!(matches!(passed, Err(ApplicationError::Unauthorized)));
    }

    #[tokio::test]
    async fn response_matches_normalized_upload_error() {
        let policy = UploadPolicy::default();
        let error = || UploadError::invalid_type("application/pdf", &policy);
        let normalized = normalize_upload_error(error().into()).unwrap();

        let response = ApplicationError::from(error()).into_response();

        assert_eq!(response.status(), normalized.status);
        assert_eq!(body_json(response).await["message"], normalized.message.as_str());
    }

    #[tokio::test]
    async fn every_response_body_has_a_message() {
        let policy = UploadPolicy::default();
        let cases = [
            (
                ApplicationError::from(UploadError::too_large(&policy)),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApplicationError::from(UploadError::StorageFailure("disk".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApplicationError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                ApplicationError::BadRequest("Invalid request format".to_string()),
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, status) in cases {
            let response = error.into_response();
            assert_eq!(response.status(), status);
            let body = body_json(response).await;
            assert!(body["message"].is_string(), "{body}");
        }
    }
}
