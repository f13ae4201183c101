//! lp-server library - HTTP API of the Korean vocabulary portal

use axum::Router;
use lp_common::Database;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod error;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Shared database handle
    pub db: Database,
}

impl AppState {
    /// Create new application state
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::word_routes())
        .merge(api::group_routes())
        .merge(api::activity_routes())
        .merge(api::session_routes())
        .merge(api::sentence_practice_routes())
        .merge(api::dashboard_routes())
        .merge(api::settings_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
