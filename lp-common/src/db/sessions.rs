//! Study session, word review and sentence attempt queries

use super::models::{
    percentage, SentencePracticeAttempt, StudySession, StudySessionSummary, WordReview,
};
use super::Database;
use crate::error::classify_write;
use crate::time::now;
use crate::{Error, Result};
use sqlx::{SqliteConnection, SqliteExecutor};

pub(crate) const SESSION_COLUMNS: &str =
    "id, group_id, study_activity_id, completed_at, created_at, updated_at, deleted_at";

const SUMMARY_SELECT: &str = r#"
    SELECT s.id, s.group_id, g.name AS group_name,
           s.study_activity_id AS activity_id, a.name AS activity_name,
           s.created_at AS start_time, s.completed_at AS end_time,
           COUNT(r.id) AS review_items_count,
           COALESCE(SUM(CASE WHEN r.correct = 1 THEN 1 ELSE 0 END), 0) AS correct_count,
           COALESCE(SUM(CASE WHEN r.correct = 0 THEN 1 ELSE 0 END), 0) AS wrong_count
    FROM study_sessions s
    JOIN groups g ON g.id = s.group_id
    JOIN study_activities a ON a.id = s.study_activity_id
    LEFT JOIN word_reviews r ON r.study_session_id = s.id AND r.deleted_at IS NULL
"#;

/// Which sessions a summary listing covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFilter {
    All,
    Group(i64),
    Activity(i64),
}

impl SessionFilter {
    fn clause(&self) -> &'static str {
        match self {
            SessionFilter::All => "s.deleted_at IS NULL",
            SessionFilter::Group(_) => "s.deleted_at IS NULL AND s.group_id = ?",
            SessionFilter::Activity(_) => "s.deleted_at IS NULL AND s.study_activity_id = ?",
        }
    }
}

/// Insert an open session and return its id
pub async fn insert_session(
    conn: &mut SqliteConnection,
    group_id: i64,
    study_activity_id: i64,
) -> Result<i64> {
    let ts = now();
    let result = sqlx::query(
        r#"
        INSERT INTO study_sessions (group_id, study_activity_id, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(group_id)
    .bind(study_activity_id)
    .bind(ts)
    .bind(ts)
    .execute(conn)
    .await
    .map_err(|e| classify_write(e, "Study session already exists", "Group or activity not found"))?;

    Ok(result.last_insert_rowid())
}

/// Fetch a live session
pub async fn get_session<'e>(ex: impl SqliteExecutor<'e>, id: i64) -> Result<StudySession> {
    let sql = format!(
        "SELECT {} FROM study_sessions WHERE id = ? AND deleted_at IS NULL",
        SESSION_COLUMNS
    );
    sqlx::query_as::<_, StudySession>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Study session {} not found", id)))
}

/// Set `completed_at` if the session is still open; returns whether it changed
pub async fn mark_completed(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let ts = now();
    let result = sqlx::query(
        r#"
        UPDATE study_sessions
        SET completed_at = ?, updated_at = ?
        WHERE id = ? AND completed_at IS NULL AND deleted_at IS NULL
        "#,
    )
    .bind(ts)
    .bind(ts)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Soft-delete a session; its reviews drop out of every aggregate
pub async fn delete_session(db: &Database, id: i64) -> Result<()> {
    let mut tx = db.begin_write().await?;
    get_session(tx.conn(), id).await?;

    let ts = now();
    sqlx::query("UPDATE study_sessions SET deleted_at = ?, updated_at = ? WHERE id = ?")
        .bind(ts)
        .bind(ts)
        .bind(id)
        .execute(tx.conn())
        .await?;

    tx.commit().await
}

pub async fn insert_review(
    conn: &mut SqliteConnection,
    study_session_id: i64,
    word_id: i64,
    correct: bool,
) -> Result<WordReview> {
    let review = sqlx::query_as::<_, WordReview>(
        r#"
        INSERT INTO word_reviews (study_session_id, word_id, correct, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, study_session_id, word_id, correct, created_at
        "#,
    )
    .bind(study_session_id)
    .bind(word_id)
    .bind(correct)
    .bind(now())
    .fetch_one(conn)
    .await
    .map_err(|e| classify_write(e, "Review already exists", "Session or word not found"))?;
    Ok(review)
}

/// Live reviews of a session, oldest first
pub async fn reviews_for_session<'e>(
    ex: impl SqliteExecutor<'e>,
    study_session_id: i64,
) -> Result<Vec<WordReview>> {
    let reviews = sqlx::query_as::<_, WordReview>(
        r#"
        SELECT id, study_session_id, word_id, correct, created_at
        FROM word_reviews
        WHERE study_session_id = ? AND deleted_at IS NULL
        ORDER BY id
        "#,
    )
    .bind(study_session_id)
    .fetch_all(ex)
    .await?;
    Ok(reviews)
}

pub async fn insert_attempt(
    conn: &mut SqliteConnection,
    word_id: i64,
    user_translation: &str,
    correct: bool,
) -> Result<SentencePracticeAttempt> {
    let attempt = sqlx::query_as::<_, SentencePracticeAttempt>(
        r#"
        INSERT INTO sentence_practice_attempts (word_id, user_translation, correct, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, word_id, user_translation, correct, created_at
        "#,
    )
    .bind(word_id)
    .bind(user_translation)
    .bind(correct)
    .bind(now())
    .fetch_one(conn)
    .await
    .map_err(|e| classify_write(e, "Attempt already exists", "Word not found"))?;
    Ok(attempt)
}

/// Summary (names and review tallies) of one live session
pub async fn get_session_summary<'e>(
    ex: impl SqliteExecutor<'e>,
    id: i64,
) -> Result<StudySessionSummary> {
    let sql = format!("{} WHERE s.id = ? AND s.deleted_at IS NULL GROUP BY s.id", SUMMARY_SELECT);
    sqlx::query_as::<_, StudySessionSummary>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await?
        .map(with_success_rate)
        .ok_or_else(|| Error::NotFound(format!("Study session {} not found", id)))
}

/// Page of session summaries, newest first
pub async fn list_session_summaries<'e>(
    ex: impl SqliteExecutor<'e>,
    filter: SessionFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<StudySessionSummary>> {
    let sql = format!(
        "{} WHERE {} GROUP BY s.id ORDER BY s.created_at DESC, s.id DESC LIMIT ? OFFSET ?",
        SUMMARY_SELECT,
        filter.clause()
    );
    let mut query = sqlx::query_as::<_, StudySessionSummary>(&sql);
    if let SessionFilter::Group(id) | SessionFilter::Activity(id) = filter {
        query = query.bind(id);
    }
    let rows = query.bind(limit).bind(offset).fetch_all(ex).await?;
    Ok(rows.into_iter().map(with_success_rate).collect())
}

/// Number of live sessions matching `filter`
pub async fn count_sessions<'e>(ex: impl SqliteExecutor<'e>, filter: SessionFilter) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM study_sessions s WHERE {}", filter.clause());
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    if let SessionFilter::Group(id) | SessionFilter::Activity(id) = filter {
        query = query.bind(id);
    }
    let count = query.fetch_one(ex).await?;
    Ok(count)
}

fn with_success_rate(mut summary: StudySessionSummary) -> StudySessionSummary {
    summary.success_rate = percentage(
        summary.correct_count,
        summary.correct_count + summary.wrong_count,
    );
    summary
}
