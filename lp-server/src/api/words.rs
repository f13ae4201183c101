//! Word endpoints

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use lp_common::db::WordWithStats;
use lp_common::pagination::Page;
use lp_common::queries::{self, WordDetails, WordListQuery};

use super::ListParams;
use crate::{ApiResult, AppState};

/// GET /api/words
pub async fn list_words(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<Page<WordWithStats>>> {
    let Query(params) = params?;
    let query = WordListQuery::parse(
        params.page,
        params.per_page,
        params.sort_by.as_deref(),
        params.order.as_deref(),
    )?;
    Ok(Json(queries::list_words(state.db.pool(), &query).await?))
}

/// GET /api/words/:id
pub async fn get_word(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<WordDetails>> {
    let Path(id) = id?;
    Ok(Json(queries::get_word_details(state.db.pool(), id).await?))
}

pub fn word_routes() -> Router<AppState> {
    Router::new()
        .route("/api/words", get(list_words))
        .route("/api/words/:id", get(get_word))
}
