//! Integration tests for lp-server API endpoints
//!
//! Each test builds the router over a fresh SQLite file seeded from a small
//! corpus: School = {학교, 학생}, Food = {사과}.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use lp_common::db::open_database;
use lp_common::seed::init_and_seed;
use lp_server::{build_router, AppState};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const WORDS: &str = r#"[
    {"hangul": "학교", "romanization": "hakgyo", "type": "noun", "english": ["school"],
     "example_sentence": {"korean": "나는 학교에 갑니다", "english": "I go to school"}},
    {"hangul": "학생", "romanization": "haksaeng", "type": "noun", "english": ["student"]},
    {"hangul": "사과", "romanization": "sagwa", "type": "noun", "english": ["apple"]}
]"#;

const GROUPS: &str = r#"{"groups": {
    "School": {"description": "school words", "words": [
        {"hangul": "학교", "romanization": "hakgyo", "english": ["school"]},
        {"hangul": "학생", "romanization": "haksaeng", "english": ["student"]}
    ]},
    "Food": {"description": "food words", "words": [
        {"hangul": "사과", "romanization": "sagwa", "english": ["apple"]}
    ]}
}}"#;

/// Test helper: seeded app over a temporary database
async fn setup_app() -> (TempDir, Router) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("data_korean.json"), WORDS).unwrap();
    std::fs::write(dir.path().join("word_groups.json"), GROUPS).unwrap();

    let db = open_database(&dir.path().join("lang_portal.db"))
        .await
        .expect("Should open test database");
    init_and_seed(&db, dir.path()).await.expect("Should seed");
    (dir, build_router(AppState::new(db)))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

async fn id_by_name(app: &Router, uri: &str, name: &str) -> i64 {
    let (_, body) = send(app, get(uri)).await;
    let items = body.get("items").unwrap_or(&body);
    items
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["name"] == name)
        .unwrap_or_else(|| panic!("{} not listed at {}", name, uri))["id"]
        .as_i64()
        .unwrap()
}

async fn word_id(app: &Router, hangul: &str) -> i64 {
    let (_, body) = send(app, get("/api/words")).await;
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|w| w["hangul"] == hangul)
        .unwrap()["id"]
        .as_i64()
        .unwrap()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (_dir, app) = setup_app().await;
    let (status, body) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "lp-server");
    assert!(body["version"].is_string());
}

// =============================================================================
// Words and groups
// =============================================================================

#[tokio::test]
async fn test_list_words_paginates() {
    let (_dir, app) = setup_app().await;
    let (status, body) = send(&app, get("/api/words?page=1&per_page=1&sort_by=hangul&order=asc")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["hangul"], "사과");
    assert_eq!(body["pagination"]["total_items"], 3);
    assert_eq!(body["pagination"]["total_pages"], 3);
    assert_eq!(body["pagination"]["current_page"], 1);
}

#[tokio::test]
async fn test_invalid_pagination_is_bad_request() {
    let (_dir, app) = setup_app().await;

    for uri in [
        "/api/words?page=0",
        "/api/words?per_page=0",
        "/api/words?page=abc",
        "/api/words?sort_by=color",
        "/api/groups?order=sideways",
    ] {
        let (status, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert!(body["error"].is_string(), "{}", uri);
    }
}

#[tokio::test]
async fn test_word_detail_lists_groups() {
    let (_dir, app) = setup_app().await;
    let id = word_id(&app, "학교").await;

    let (status, body) = send(&app, get(&format!("/api/words/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hangul"], "학교");
    assert_eq!(body["type"], "noun");
    assert_eq!(body["correct_count"], 0);
    assert_eq!(body["groups"][0]["name"], "School");
}

#[tokio::test]
async fn test_missing_and_malformed_ids() {
    let (_dir, app) = setup_app().await;

    let (status, body) = send(&app, get("/api/words/99999")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, get("/api/words/abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, get("/api/groups/99999/words")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_group_reads() {
    let (_dir, app) = setup_app().await;
    let school = id_by_name(&app, "/api/groups", "School").await;

    let (status, body) = send(&app, get(&format!("/api/groups/{}", school))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["words_count"], 2);

    let (status, body) = send(&app, get(&format!("/api/groups/{}/words", school))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, get(&format!("/api/groups/{}/study_sessions", school))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total_items"], 0);
}

// =============================================================================
// Activities and sessions
// =============================================================================

#[tokio::test]
async fn test_three_canonical_activities() {
    let (_dir, app) = setup_app().await;
    let (status, body) = send(&app, get("/api/study_activities")).await;

    assert_eq!(status, StatusCode::OK);
    let types: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["flashcards", "multiple_choice", "sentence_practice"]);
}

#[tokio::test]
async fn test_create_activity_conflicts_and_validation() {
    let (_dir, app) = setup_app().await;

    let (status, body) = send(
        &app,
        post_json("/api/study_activities", json!({"name": "Speed Drill", "type": "flashcards"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Speed Drill");

    let (status, body) = send(
        &app,
        post_json("/api/study_activities", json!({"name": "Flashcards", "type": "flashcards"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        post_json("/api/study_activities", json!({"name": "Karaoke", "type": "singing"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_launch_requires_existing_group() {
    let (_dir, app) = setup_app().await;
    let flashcards = id_by_name(&app, "/api/study_activities", "Flashcards").await;

    let (status, _) = send(
        &app,
        post_json(
            &format!("/api/study_activities/{}/launch", flashcards),
            json!({"group_id": 99999}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        post_json(&format!("/api/study_activities/{}/launch", flashcards), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_session_flow_feeds_dashboard() {
    let (_dir, app) = setup_app().await;
    let flashcards = id_by_name(&app, "/api/study_activities", "Flashcards").await;
    let school = id_by_name(&app, "/api/groups", "School").await;
    let hakgyo = word_id(&app, "학교").await;

    let (status, body) = send(&app, get("/api/dashboard/last_study_session")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_null());

    let (status, session) = send(
        &app,
        post_json(
            &format!("/api/study_activities/{}/launch", flashcards),
            json!({"group_id": school}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = session["id"].as_i64().unwrap();
    assert!(session["completed_at"].is_null());

    let review_uri = format!("/api/study_sessions/{}/words/{}/review", session_id, hakgyo);
    let (status, review) = send(&app, post_json(&review_uri, json!({"correct": true}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(review["correct"], true);
    let (status, _) = send(&app, post_json(&review_uri, json!({"correct": false}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, completed) =
        send(&app, post_empty(&format!("/api/study_sessions/{}/complete", session_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(completed["completed_at"].is_string());

    let (_, last) = send(&app, get("/api/dashboard/last_study_session")).await;
    assert_eq!(last["id"], session_id);
    assert_eq!(last["activity_name"], "Flashcards");
    assert_eq!(last["group_name"], "School");
    assert_eq!(last["stats"]["correct_count"], 1);
    assert_eq!(last["stats"]["wrong_count"], 1);

    let (_, stats) = send(&app, get("/api/dashboard/quick_stats")).await;
    assert_eq!(stats["success_rate"], 50.0);
    assert_eq!(stats["total_sessions"], 1);
    assert_eq!(stats["total_active_groups"], 2);
    assert_eq!(stats["study_streak"], 1);

    let (_, progress) = send(&app, get("/api/dashboard/study_progress")).await;
    assert_eq!(progress["words_studied"], 1);
    assert_eq!(progress["total_words"], 3);

    let (_, summary) = send(&app, get(&format!("/api/study_sessions/{}", session_id))).await;
    assert_eq!(summary["review_items_count"], 2);

    let (_, combined) = send(&app, get("/api/dashboard")).await;
    assert_eq!(combined["last_study_session"]["id"], session_id);
    assert_eq!(combined["quick_stats"]["total_sessions"], 1);
}

#[tokio::test]
async fn test_create_session_and_review_missing_word() {
    let (_dir, app) = setup_app().await;
    let flashcards = id_by_name(&app, "/api/study_activities", "Flashcards").await;
    let food = id_by_name(&app, "/api/groups", "Food").await;

    let (status, session) = send(
        &app,
        post_json(
            "/api/study_sessions",
            json!({"group_id": food, "study_activity_id": flashcards}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = session["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        post_json(
            &format!("/api/study_sessions/{}/words/99999/review", session_id),
            json!({"correct": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, get("/api/study_sessions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"][0]["id"], session_id);
    assert_eq!(body["items"][0]["group_name"], "Food");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (_dir, app) = setup_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/study_sessions")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

// =============================================================================
// Sentence practice
// =============================================================================

#[tokio::test]
async fn test_sentence_attempts_and_statistics() {
    let (_dir, app) = setup_app().await;
    let hakgyo = word_id(&app, "학교").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/sentence_practice/attempt",
            json!({"sentence_id": hakgyo, "user_translation": "  나는 학교에 갑니다 "}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["correct"], true);
    assert_eq!(body["canonical_translation"], "나는 학교에 갑니다");

    let (_, body) = send(
        &app,
        post_json(
            "/api/sentence_practice/attempt",
            json!({"word_id": hakgyo, "user_translation": "Wrong"}),
        ),
    )
    .await;
    assert_eq!(body["correct"], false);

    let (status, stats) = send(&app, get("/api/sentence_practice/statistics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_sentences_attempted"], 2);
    assert_eq!(stats["correct_answers"], 1);
    assert_eq!(stats["accuracy_rate"], 50.0);
}

#[tokio::test]
async fn test_attempt_without_example_is_not_found() {
    let (_dir, app) = setup_app().await;
    let sagwa = word_id(&app, "사과").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/sentence_practice/attempt",
            json!({"sentence_id": sagwa, "user_translation": "사과"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_sentence_examples_and_practice() {
    let (_dir, app) = setup_app().await;

    let (status, body) = send(&app, get("/api/sentence_practice/examples?word=hakgyo")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["example_sentences"][0]["korean"], "나는 학교에 갑니다");

    let (status, body) = send(&app, get("/api/sentence_practice/examples?word=none")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["example_sentences"].as_array().unwrap().len(), 0);

    let (status, _) = send(&app, get("/api/sentence_practice/examples")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, get("/api/sentence_practice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["word"]["hangul"], "학교");
}

// =============================================================================
// Settings
// =============================================================================

#[tokio::test]
async fn test_reset_history_keeps_vocabulary() {
    let (_dir, app) = setup_app().await;
    let flashcards = id_by_name(&app, "/api/study_activities", "Flashcards").await;
    let school = id_by_name(&app, "/api/groups", "School").await;
    send(
        &app,
        post_json(
            &format!("/api/study_activities/{}/launch", flashcards),
            json!({"group_id": school}),
        ),
    )
    .await;

    let (status, body) = send(&app, post_empty("/api/settings/reset_history")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (_, sessions) = send(&app, get("/api/study_sessions")).await;
    assert_eq!(sessions["pagination"]["total_items"], 0);
    let (_, words) = send(&app, get("/api/words")).await;
    assert_eq!(words["pagination"]["total_items"], 3);
}

#[tokio::test]
async fn test_full_reset_leaves_only_activities() {
    let (_dir, app) = setup_app().await;

    let (status, _) = send(&app, post_empty("/api/settings/full_reset")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, words) = send(&app, get("/api/words")).await;
    assert_eq!(words["pagination"]["total_items"], 0);
    let (_, groups) = send(&app, get("/api/groups")).await;
    assert_eq!(groups["pagination"]["total_items"], 0);
    let (_, activities) = send(&app, get("/api/study_activities")).await;
    assert_eq!(activities.as_array().unwrap().len(), 3);
}
