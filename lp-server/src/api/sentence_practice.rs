//! Sentence translation practice

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lp_common::db::{ExampleSentence, SentencePracticeAttempt};
use lp_common::queries::{self, PracticeSentence, SentenceStatistics};
use lp_common::recorder;
use serde::{Deserialize, Serialize};

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ExamplesParams {
    pub word: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExamplesResponse {
    pub word: String,
    pub example_sentences: Vec<ExampleSentence>,
}

/// Body of POST /api/sentence_practice/attempt
#[derive(Debug, Deserialize)]
pub struct AttemptRequest {
    #[serde(alias = "word_id")]
    pub sentence_id: i64,
    pub user_translation: String,
}

#[derive(Debug, Serialize)]
pub struct AttemptResponse {
    pub correct: bool,
    pub message: String,
    pub canonical_translation: String,
    pub attempt: SentencePracticeAttempt,
}

/// GET /api/sentence_practice
pub async fn practice_sentence(
    State(state): State<AppState>,
) -> ApiResult<Json<PracticeSentence>> {
    Ok(Json(queries::random_practice_sentence(state.db.pool()).await?))
}

/// GET /api/sentence_practice/examples?word=
pub async fn sentence_examples(
    State(state): State<AppState>,
    params: Result<Query<ExamplesParams>, QueryRejection>,
) -> ApiResult<Json<ExamplesResponse>> {
    let Query(params) = params?;
    let word = params
        .word
        .ok_or_else(|| ApiError::BadRequest("Missing 'word' query parameter".to_string()))?;
    let examples = queries::sentence_examples(state.db.pool(), &word).await?;

    Ok(Json(ExamplesResponse {
        word,
        example_sentences: examples
            .into_iter()
            .map(|e| ExampleSentence {
                korean: e.korean,
                english: e.english,
            })
            .collect(),
    }))
}

/// POST /api/sentence_practice/attempt
pub async fn submit_attempt(
    State(state): State<AppState>,
    body: Result<Json<AttemptRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AttemptResponse>)> {
    let Json(request) = body?;
    let outcome =
        recorder::record_sentence_attempt(&state.db, request.sentence_id, &request.user_translation)
            .await?;

    let message = if outcome.correct {
        "Correct!".to_string()
    } else {
        "Not quite. Compare with the example sentence.".to_string()
    };
    Ok((
        StatusCode::CREATED,
        Json(AttemptResponse {
            correct: outcome.correct,
            message,
            canonical_translation: outcome.canonical_translation,
            attempt: outcome.attempt,
        }),
    ))
}

/// GET /api/sentence_practice/statistics
pub async fn statistics(
    State(state): State<AppState>,
) -> ApiResult<Json<SentenceStatistics>> {
    Ok(Json(queries::sentence_statistics(state.db.pool()).await?))
}

pub fn sentence_practice_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sentence_practice", get(practice_sentence))
        .route("/api/sentence_practice/examples", get(sentence_examples))
        .route("/api/sentence_practice/attempt", post(submit_attempt))
        .route("/api/sentence_practice/statistics", get(statistics))
}
