//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;
use tracing::info;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub module: String,
    pub version: String,
}

/// GET /health-check
///
/// Does not touch the databases or the fare-search API.
pub async fn health_check() -> Json<HealthResponse> {
    info!("Requested health-check");
    Json(HealthResponse {
        success: true,
        message: "All clear".to_string(),
        module: "kowalski-cmp".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health-check", get(health_check))
}
