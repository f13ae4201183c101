//! Dashboard endpoints

use axum::{extract::State, routing::get, Json, Router};
use lp_common::dashboard::{self, Dashboard, LastStudySession, QuickStats, StudyProgress};

use crate::{ApiResult, AppState};

/// GET /api/dashboard
pub async fn combined(State(state): State<AppState>) -> ApiResult<Json<Dashboard>> {
    Ok(Json(dashboard::dashboard(state.db.pool()).await?))
}

/// GET /api/dashboard/last_study_session
///
/// Renders JSON `null` until some session has been completed.
pub async fn last_study_session(
    State(state): State<AppState>,
) -> ApiResult<Json<Option<LastStudySession>>> {
    Ok(Json(dashboard::last_study_session(state.db.pool()).await?))
}

/// GET /api/dashboard/study_progress
pub async fn study_progress(State(state): State<AppState>) -> ApiResult<Json<StudyProgress>> {
    Ok(Json(dashboard::study_progress(state.db.pool()).await?))
}

/// GET /api/dashboard/quick_stats
pub async fn quick_stats(State(state): State<AppState>) -> ApiResult<Json<QuickStats>> {
    Ok(Json(dashboard::quick_stats(state.db.pool()).await?))
}

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/api/dashboard", get(combined))
        .route("/api/dashboard/last_study_session", get(last_study_session))
        .route("/api/dashboard/study_progress", get(study_progress))
        .route("/api/dashboard/quick_stats", get(quick_stats))
}
