//! Study activity endpoints, including session launch

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lp_common::db::{activities, NewStudyActivity, StudyActivity, StudySession, StudySessionSummary};
use lp_common::pagination::Page;
use lp_common::{queries, recorder};
use serde::Deserialize;

use super::PageParams;
use crate::{ApiResult, AppState};

/// Body of POST /api/study_activities/:id/launch
#[derive(Debug, Deserialize)]
pub struct LaunchRequest {
    pub group_id: i64,
}

/// GET /api/study_activities
pub async fn list_activities(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<StudyActivity>>> {
    Ok(Json(queries::list_activities(state.db.pool()).await?))
}

/// POST /api/study_activities
///
/// An unknown `type` fails deserialization and is reported as 400.
pub async fn create_activity(
    State(state): State<AppState>,
    body: Result<Json<NewStudyActivity>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StudyActivity>)> {
    let Json(new_activity) = body?;
    let activity = activities::create_activity(&state.db, &new_activity).await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// GET /api/study_activities/:id
pub async fn get_activity(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<StudyActivity>> {
    let Path(id) = id?;
    Ok(Json(queries::get_activity_by_id(state.db.pool(), id).await?))
}

/// GET /api/study_activities/:id/study_sessions
pub async fn activity_sessions(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<Page<StudySessionSummary>>> {
    let Path(id) = id?;
    let Query(params) = params?;
    let page = params.to_request()?;
    Ok(Json(queries::activity_sessions(state.db.pool(), id, page).await?))
}

/// POST /api/study_activities/:id/launch
pub async fn launch_activity(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Result<Json<LaunchRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<StudySession>)> {
    let Path(id) = id?;
    let Json(request) = body?;
    let session = recorder::launch_session(&state.db, id, request.group_id).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub fn activity_routes() -> Router<AppState> {
    Router::new()
        .route("/api/study_activities", get(list_activities).post(create_activity))
        .route("/api/study_activities/:id", get(get_activity))
        .route("/api/study_activities/:id/study_sessions", get(activity_sessions))
        .route("/api/study_activities/:id/launch", post(launch_activity))
}
