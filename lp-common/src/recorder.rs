//! Study session and review recording
//!
//! Every operation runs in one write transaction, retried as a whole while
//! another process holds the SQLite write lock. Missing or soft-deleted
//! references fail with [`Error::NotFound`] before anything is written.

use crate::db::activities::get_activity;
use crate::db::groups::get_group;
use crate::db::sessions::{get_session, insert_attempt, insert_review, insert_session, mark_completed};
use crate::db::retry::{retry_on_lock, MAX_LOCK_WAIT_MS};
use crate::db::words::get_word;
use crate::db::{Database, SentencePracticeAttempt, StudySession, WordReview};
use crate::{Error, Result};
use serde::Serialize;
use tracing::{debug, info};

/// Result of checking a sentence translation
#[derive(Debug, Clone, Serialize)]
pub struct SentenceAttemptOutcome {
    pub attempt: SentencePracticeAttempt,
    pub correct: bool,
    /// Reference sentence for client display
    pub canonical_translation: String,
}

/// Open a session of `study_activity_id` over `group_id`
pub async fn launch_session(
    db: &Database,
    study_activity_id: i64,
    group_id: i64,
) -> Result<StudySession> {
    let session = retry_on_lock("launch session", MAX_LOCK_WAIT_MS, || {
        launch_once(db, study_activity_id, group_id)
    })
    .await?;

    info!(
        "Launched study session {} (activity {}, group {})",
        session.id, study_activity_id, group_id
    );
    Ok(session)
}

async fn launch_once(db: &Database, study_activity_id: i64, group_id: i64) -> Result<StudySession> {
    let mut tx = db.begin_write().await?;
    get_activity(tx.conn(), study_activity_id).await?;
    get_group(tx.conn(), group_id).await?;

    let id = insert_session(tx.conn(), group_id, study_activity_id).await?;
    let session = get_session(tx.conn(), id).await?;
    tx.commit().await?;
    Ok(session)
}

/// Record one review outcome
///
/// Completed sessions still accept reviews.
pub async fn record_review(
    db: &Database,
    study_session_id: i64,
    word_id: i64,
    correct: bool,
) -> Result<WordReview> {
    let review = retry_on_lock("record review", MAX_LOCK_WAIT_MS, || {
        review_once(db, study_session_id, word_id, correct)
    })
    .await?;

    debug!(
        "Recorded review {} (session {}, word {}, correct {})",
        review.id, study_session_id, word_id, correct
    );
    Ok(review)
}

async fn review_once(
    db: &Database,
    study_session_id: i64,
    word_id: i64,
    correct: bool,
) -> Result<WordReview> {
    let mut tx = db.begin_write().await?;
    get_session(tx.conn(), study_session_id).await?;
    get_word(tx.conn(), word_id).await?;

    let review = insert_review(tx.conn(), study_session_id, word_id, correct).await?;
    tx.commit().await?;
    Ok(review)
}

/// Mark a session completed; completing twice keeps the first timestamp
pub async fn complete_session(db: &Database, study_session_id: i64) -> Result<StudySession> {
    let (session, changed) = retry_on_lock("complete session", MAX_LOCK_WAIT_MS, || {
        complete_once(db, study_session_id)
    })
    .await?;

    if changed {
        info!("Completed study session {}", study_session_id);
    }
    Ok(session)
}

async fn complete_once(db: &Database, study_session_id: i64) -> Result<(StudySession, bool)> {
    let mut tx = db.begin_write().await?;
    get_session(tx.conn(), study_session_id).await?;

    let changed = mark_completed(tx.conn(), study_session_id).await?;
    let session = get_session(tx.conn(), study_session_id).await?;
    tx.commit().await?;
    Ok((session, changed))
}

/// Check a translation against the word's example sentence and store it
pub async fn record_sentence_attempt(
    db: &Database,
    word_id: i64,
    user_translation: &str,
) -> Result<SentenceAttemptOutcome> {
    retry_on_lock("record sentence attempt", MAX_LOCK_WAIT_MS, || {
        attempt_once(db, word_id, user_translation)
    })
    .await
}

async fn attempt_once(
    db: &Database,
    word_id: i64,
    user_translation: &str,
) -> Result<SentenceAttemptOutcome> {
    let mut tx = db.begin_write().await?;
    let word = get_word(tx.conn(), word_id).await?;
    let canonical = word
        .example
        .map(|e| e.korean)
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| Error::NotFound(format!("Word {} has no example sentence", word_id)))?;

    let correct = translation_matches(user_translation, &canonical);
    let attempt = insert_attempt(tx.conn(), word_id, user_translation, correct).await?;
    tx.commit().await?;

    Ok(SentenceAttemptOutcome {
        attempt,
        correct,
        canonical_translation: canonical.trim().to_string(),
    })
}

/// Exact comparison after trimming outer whitespace on both sides
pub fn translation_matches(user_translation: &str, canonical: &str) -> bool {
    user_translation.trim() == canonical.trim()
}
