mod adapters;
mod application;
mod domain;
mod services;

use std::{path::PathBuf, sync::Arc};

use adapters::{middleware::TokenVerifier, routes::build_router, state::AppState};
use application::{
    dto::upload_policy_dto::UploadPolicyDTO,
    services::{SystemClock, UploadService},
};
use domain::config::{server::ServerConfig, upload_policy::UploadPolicy};
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

fn load_server_config() -> ServerConfig {
    let defaults = ServerConfig::default();

    let port = std::env::var("PORT")
        .map(|p| p.parse::<u16>().expect("PORT must be a valid u16"))
        .unwrap_or(defaults.port);

    let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS").ok().map(|origins| {
        origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    });

    let upload_root = std::env::var("UPLOAD_ROOT")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or(defaults.upload_root);

    let public_base_url = std::env::var("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url);

    let jwt_secret = std::env::var("JWT_SECRET")
        .ok()
        .filter(|s| !s.trim().is_empty());

    ServerConfig {
        port,
        cors_allowed_origins,
        upload_root,
        public_base_url,
        jwt_secret,
    }
}

fn cors_layer(allowed_origins: Option<&Vec<String>>) -> CorsLayer {
    match allowed_origins {
        Some(origins) => {
            let origins: Vec<_> = origins
                .iter()
                .map(|s| s.parse().expect("Invalid CORS origin"))
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        // Allow all origins if not specified (only for development)
        None => CorsLayer::permissive(),
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_server_config();

    let policy_dto = UploadPolicyDTO::from_env()
        .unwrap_or_else(|e| panic!("ERROR: invalid upload policy configuration: {}", e));
    let policy = UploadPolicy::try_from(policy_dto)
        .unwrap_or_else(|e| panic!("ERROR: invalid upload policy: {}", e));

    tracing::info!(
        "Upload policy: {} accepted types, max size {}",
        policy.accepted_types().len(),
        policy.max_size_label()
    );

    let logo_directory = config.logo_directory();
    let storage = services::create_storage_service(&logo_directory)
        .await
        .unwrap_or_else(|e| panic!("ERROR: cannot prepare upload directory: {}", e));
    tracing::info!("Storing logos in {}", logo_directory.display());

    let token_verifier = match config.jwt_secret.as_deref() {
        Some(secret) => Some(TokenVerifier::new(secret)),
        None => {
            tracing::warn!("JWT_SECRET not set, logo uploads are not authenticated");
            None
        }
    };

    let app_state = AppState {
        upload_service: UploadService::new(Arc::new(policy), storage, Arc::new(SystemClock)),
        token_verifier,
        public_base_url: config.public_base_url.clone(),
    };

    let router = build_router(
        app_state,
        &logo_directory,
        cors_layer(config.cors_allowed_origins.as_ref()),
    );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("Failed to bind to port");

    tracing::info!("Server listening on 0.0.0.0:{}", config.port);

    axum::serve(listener, router)
        .await
        .expect("Failed to start server");
}
