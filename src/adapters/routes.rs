use std::path::Path;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    adapters::{
        controllers::{health_controller::HealthController, upload_controller::UploadController},
        middleware::require_bearer_token,
        state::AppState,
    },
    domain::config::{server::LOGO_DIRECTORY, upload_policy::MIB},
};

pub const LOGO_UPLOAD_ROUTE: &str = "/api/v1/uploads/company-logos";

/// Room for multipart framing on top of the policy limit. Anything beyond this is cut
/// off by the body limit and reported as too large.
const MULTIPART_OVERHEAD_BYTES: u64 = MIB;

async fn hello_world() -> &'static str {
    "Hello, world!"
}

pub fn request_body_limit(max_bytes: u64) -> usize {
    usize::try_from(max_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)).unwrap_or(usize::MAX)
}

pub fn build_router(app_state: AppState, logo_directory: &Path, cors: CorsLayer) -> Router {
    let body_limit = request_body_limit(app_state.upload_service.policy().max_bytes());

    let mut upload_routes = Router::new()
        .route(LOGO_UPLOAD_ROUTE, post(UploadController::upload_company_logo))
        .layer(DefaultBodyLimit::max(body_limit));

    // Upload route requires a bearer token when a signing secret is configured
    if let Some(verifier) = app_state.token_verifier.clone() {
        upload_routes =
            upload_routes.route_layer(middleware::from_fn_with_state(verifier, require_bearer_token));
    }

    let public_routes = Router::new()
        .route("/", get(hello_world))
        .route("/api/v1/health", get(HealthController::health_check));

    Router::new()
        .merge(upload_routes)
        .merge(public_routes)
        .nest_service(
            &format!("/uploads/{}", LOGO_DIRECTORY),
            ServeDir::new(logo_directory),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}
