//! Comparison endpoints
//!
//! Both return either a complete report or the one-key placeholder when no
//! directions could be resolved. Malformed bodies are rejected with 400.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};

use crate::error::ApiResult;
use crate::models::{ComparisonBody, MinirulesBody};
use crate::report::{ComparisonReport, MinirulesReport, Report};
use crate::AppState;

/// POST /config_comparison/
pub async fn config_comparison(
    State(state): State<AppState>,
    body: Result<Json<ComparisonBody>, JsonRejection>,
) -> ApiResult<Json<Report<ComparisonReport>>> {
    let Json(body) = body?;
    let report = state.service.make_config_comparison(&body).await?;
    Ok(Json(report))
}

/// POST /minirules_comparison/
pub async fn minirules_comparison(
    State(state): State<AppState>,
    body: Result<Json<MinirulesBody>, JsonRejection>,
) -> ApiResult<Json<Report<MinirulesReport>>> {
    let Json(body) = body?;
    let report = state.service.make_minirules_comparison(&body).await?;
    Ok(Json(report))
}

/// Build comparison routes
pub fn comparison_routes() -> Router<AppState> {
    Router::new()
        .route("/config_comparison/", post(config_comparison))
        .route("/minirules_comparison/", post(minirules_comparison))
}
