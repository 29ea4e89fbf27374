use axum::{extract::State, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{ApiResponse, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    /// "healthy", "unhealthy", or "not_configured" when running without a database.
    pub database: String,
    pub timestamp: String,
}

/// Liveness and database connectivity
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service health", body = HealthStatus)),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HealthStatus>> {
    let database = match &state.db {
        Some(db) => match db.ping().await {
            Ok(()) => "healthy",
            Err(_) => "unhealthy",
        },
        None => "not_configured",
    };

    Json(ApiResponse::success(HealthStatus {
        status: if database == "unhealthy" { "degraded" } else { "up" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}
