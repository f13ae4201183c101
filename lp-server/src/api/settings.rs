//! Destructive maintenance endpoints

use axum::{extract::State, routing::post, Json, Router};
use lp_common::seed;
use tracing::warn;

use super::MessageResponse;
use crate::{ApiResult, AppState};

/// POST /api/settings/reset_history
pub async fn reset_history(State(state): State<AppState>) -> ApiResult<Json<MessageResponse>> {
    warn!("Study history reset requested");
    seed::reset_history(&state.db).await?;
    Ok(Json(MessageResponse {
        message: "Study history has been reset".to_string(),
    }))
}

/// POST /api/settings/full_reset
pub async fn full_reset(State(state): State<AppState>) -> ApiResult<Json<MessageResponse>> {
    warn!("Full reset requested");
    seed::full_reset(&state.db).await?;
    Ok(Json(MessageResponse {
        message: "Database has been fully reset".to_string(),
    }))
}

pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/api/settings/reset_history", post(reset_history))
        .route("/api/settings/full_reset", post(full_reset))
}
