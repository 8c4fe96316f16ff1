use axum::{extract::State, Json};
use serde::Serialize;
use sysinfo::System;
use tracing::info;

use crate::adapters::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(rename = "uploadDirectory")]
    pub upload_directory: String,
    #[serde(rename = "authRequired")]
    pub auth_required: bool,
    pub policy: HealthPolicyInfo,
    pub metrics: SystemMetrics,
}

#[derive(Debug, Serialize)]
pub struct SystemMetrics {
    #[serde(rename = "cpuUsagePercent")]
    pub cpu_usage_percent: f32,
    #[serde(rename = "memoryUsedBytes")]
    pub memory_used_bytes: u64,
    #[serde(rename = "memoryTotalBytes")]
    pub memory_total_bytes: u64,
    #[serde(rename = "memoryUsagePercent")]
    pub memory_usage_percent: f32,
}

#[derive(Debug, Serialize)]
pub struct HealthPolicyInfo {
    #[serde(rename = "maxBytes")]
    pub max_bytes: u64,
    #[serde(rename = "maxSize")]
    pub max_size: String,
    #[serde(rename = "acceptedTypes")]
    pub accepted_types: Vec<String>,
    pub extensions: Vec<String>,
}

pub struct HealthController;

impl HealthController {
    /// GET /api/v1/health
    pub async fn health_check(State(app_state): State<AppState>) -> Json<HealthResponse> {
        info!("Health check requested");

        let service = &app_state.upload_service;
        let policy = service.policy();
        let policy_info = HealthPolicyInfo {
            max_bytes: policy.max_bytes(),
            max_size: policy.max_size_label(),
            accepted_types: policy.accepted_mime_types(),
            extensions: policy.accepted_extensions(),
        };

        // Only refresh what's reported
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let memory_used = sys.used_memory();
        let memory_total = sys.total_memory();
        let memory_usage_percent = if memory_total > 0 {
            (memory_used as f32 / memory_total as f32) * 100.0
        } else {
            0.0
        };

        let metrics = SystemMetrics {
            cpu_usage_percent: sys.global_cpu_usage(),
            memory_used_bytes: memory_used,
            memory_total_bytes: memory_total,
            memory_usage_percent,
        };

        Json(HealthResponse {
            status: "healthy".to_string(),
            upload_directory: service.storage().directory().display().to_string(),
            auth_required: app_state.token_verifier.is_some(),
            policy: policy_info,
            metrics,
        })
    }
}
