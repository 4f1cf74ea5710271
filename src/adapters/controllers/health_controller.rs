use axum::{extract::State, Json};
use tracing::{info, warn};

use crate::adapters::{dto::health_dto::HealthResponse, state::AppState};

pub struct HealthController;

impl HealthController {
    /// GET /api/v1/health
    pub async fn health_check(State(app_state): State<AppState>) -> Json<HealthResponse> {
        info!("Health check requested");

        let stored_files = match app_state.storage_service.list().await {
            Ok(names) => Some(names.len()),
            Err(e) => {
                warn!("Health check could not list uploads: {:?}", e);
                None
            }
        };

        let config = &app_state.config;
        Json(HealthResponse {
            status: if stored_files.is_some() {
                "healthy".to_string()
            } else {
                "degraded".to_string()
            },
            upload_dir: config.upload_dir.display().to_string(),
            stored_files,
            max_upload_bytes: config.max_upload_bytes,
            allowed_types: config.policy.allowed_types(),
            allowed_extensions: config.policy.allowed_extensions(),
        })
    }
}
