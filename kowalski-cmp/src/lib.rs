//! kowalski-cmp library - fare-search configuration comparison
//!
//! Compares fare-search results of two configurations across a set of
//! directions, and checks fare-rule completeness for a single configuration.

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod city_filter;
pub mod compare;
pub mod db;
pub mod directions;
pub mod error;
pub mod fetch;
pub mod flatten;
pub mod models;
pub mod report;
pub mod search_url;
pub mod service;

use service::ComparisonService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ComparisonService>,
}

impl AppState {
    pub fn new(service: ComparisonService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::comparison_routes())
        .merge(api::city_filter_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
