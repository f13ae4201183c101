//! Study session endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lp_common::db::{StudySession, StudySessionSummary, WordReview};
use lp_common::pagination::Page;
use lp_common::{queries, recorder};
use serde::Deserialize;

use super::PageParams;
use crate::{ApiResult, AppState};

/// Body of POST /api/study_sessions
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub group_id: i64,
    pub study_activity_id: i64,
}

/// Body of POST /api/study_sessions/:id/words/:word_id/review
#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub correct: bool,
}

/// GET /api/study_sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<Page<StudySessionSummary>>> {
    let Query(params) = params?;
    let page = params.to_request()?;
    Ok(Json(queries::list_sessions(state.db.pool(), page).await?))
}

/// POST /api/study_sessions
pub async fn create_session(
    State(state): State<AppState>,
    body: Result<Json<CreateSessionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StudySession>)> {
    let Json(request) = body?;
    let session =
        recorder::launch_session(&state.db, request.study_activity_id, request.group_id).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/study_sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<StudySessionSummary>> {
    let Path(id) = id?;
    Ok(Json(queries::get_session_by_id(state.db.pool(), id).await?))
}

/// POST /api/study_sessions/:id/complete
pub async fn complete_session(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<StudySession>> {
    let Path(id) = id?;
    Ok(Json(recorder::complete_session(&state.db, id).await?))
}

/// POST /api/study_sessions/:id/words/:word_id/review
pub async fn review_word(
    State(state): State<AppState>,
    ids: Result<Path<(i64, i64)>, PathRejection>,
    body: Result<Json<ReviewRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<WordReview>)> {
    let Path((session_id, word_id)) = ids?;
    let Json(request) = body?;
    let review = recorder::record_review(&state.db, session_id, word_id, request.correct).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/study_sessions", get(list_sessions).post(create_session))
        .route("/api/study_sessions/:id", get(get_session))
        .route("/api/study_sessions/:id/complete", post(complete_session))
        .route(
            "/api/study_sessions/:id/words/:word_id/review",
            post(review_word),
        )
}
