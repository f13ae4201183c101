//! Group endpoints

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use lp_common::db::{Group, StudySessionSummary, WordWithStats};
use lp_common::pagination::Page;
use lp_common::queries::{self, GroupListQuery, WordListQuery};

use super::{ListParams, PageParams};
use crate::{ApiResult, AppState};

/// GET /api/groups
pub async fn list_groups(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Page<Group>>> {
    let Query(params) = params?;
    let query = GroupListQuery::parse(
        params.page,
        params.per_page,
        params.sort_by.as_deref(),
        params.order.as_deref(),
    )?;
    Ok(Json(queries::list_groups(state.db.pool(), &query).await?))
}

/// GET /api/groups/:id
pub async fn get_group(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Group>> {
    let Path(id) = id?;
    Ok(Json(queries::get_group_by_id(state.db.pool(), id).await?))
}

/// GET /api/groups/:id/words
pub async fn group_words(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Page<WordWithStats>>> {
    let Path(id) = id?;
    let Query(params) = params?;
    let query = WordListQuery::parse(
        params.page,
        params.per_page,
        params.sort_by.as_deref(),
        params.order.as_deref(),
    )?;
    Ok(Json(queries::group_words(state.db.pool(), id, &query).await?))
}

/// GET /api/groups/:id/study_sessions
pub async fn group_sessions(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> ApiResult<Json<Page<StudySessionSummary>>> {
    let Path(id) = id?;
    let Query(params) = params?;
    let page = params.to_request()?;
    Ok(Json(queries::group_sessions(state.db.pool(), id, page).await?))
}

pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/api/groups", get(list_groups))
        .route("/api/groups/:id", get(get_group))
        .route("/api/groups/:id/words", get(group_words))
        .route("/api/groups/:id/study_sessions", get(group_sessions))
}
