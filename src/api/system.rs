use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub environment: String,
    pub version: String,
}

/// GET /v1/healthcheck
/// Public liveness probe; also pings the database.
pub async fn healthcheck(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<HealthStatus>>, ApiError> {
    state
        .store()
        .ping()
        .await
        .map_err(|e| ApiError::internal(format!("Database ping failed: {e}")))?;

    Ok(Json(ApiResponse::success(HealthStatus {
        status: "available".to_string(),
        environment: state.config.server.environment.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })))
}
