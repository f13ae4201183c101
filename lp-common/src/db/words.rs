//! Word queries

use super::groups::refresh_words_count;
use super::models::{Group, NewWord, Word, WordRow, WordUpdate};
use super::Database;
use crate::error::classify_write;
use crate::time::now;
use crate::{Error, Result};
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqliteExecutor};
use tracing::debug;

pub(crate) const WORD_COLUMNS: &str = "words.id, words.hangul, words.romanization, \
    words.part_of_speech, words.english, words.example_korean, words.example_english, \
    words.created_at, words.updated_at, words.deleted_at";

fn validate_fields(hangul: &str, english: &[String]) -> Result<()> {
    if hangul.trim().is_empty() {
        return Err(Error::InvalidInput("hangul must not be empty".to_string()));
    }
    if english.iter().all(|e| e.trim().is_empty()) {
        return Err(Error::InvalidInput(
            "english must contain at least one translation".to_string(),
        ));
    }
    Ok(())
}

/// Insert a word and return its id
///
/// A live word with the same hangul yields [`Error::Conflict`].
pub async fn insert_word(conn: &mut SqliteConnection, word: &NewWord) -> Result<i64> {
    let hangul = word.hangul.trim();
    validate_fields(hangul, &word.english)?;

    let example = word.example.clone().unwrap_or_default();
    let ts = now();
    let result = sqlx::query(
        r#"
        INSERT INTO words
            (hangul, romanization, part_of_speech, english, example_korean, example_english,
             created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(hangul)
    .bind(word.romanization.trim())
    .bind(word.part_of_speech.trim())
    .bind(Json(&word.english))
    .bind(&example.korean)
    .bind(&example.english)
    .bind(ts)
    .bind(ts)
    .execute(conn)
    .await
    .map_err(|e| {
        classify_write(
            e,
            &format!("Word '{}' already exists", hangul),
            "Referenced record not found",
        )
    })?;

    Ok(result.last_insert_rowid())
}

/// Create a word in its own transaction
pub async fn create_word(db: &Database, word: &NewWord) -> Result<Word> {
    let mut tx = db.begin_write().await?;
    let id = insert_word(tx.conn(), word).await?;
    let created = get_word(tx.conn(), id).await?;
    tx.commit().await?;
    debug!("Created word {} ({})", created.id, created.hangul);
    Ok(created)
}

/// Fetch a live word
pub async fn get_word<'e>(ex: impl SqliteExecutor<'e>, id: i64) -> Result<Word> {
    fetch_word(ex, id, false).await
}

/// Fetch a word whether or not it has been soft-deleted
///
/// Lookup helper for inspecting tombstoned rows. Resets delete or drop whole
/// tables and never read individual words.
pub async fn get_word_including_deleted<'e>(ex: impl SqliteExecutor<'e>, id: i64) -> Result<Word> {
    fetch_word(ex, id, true).await
}

async fn fetch_word<'e>(ex: impl SqliteExecutor<'e>, id: i64, include_deleted: bool) -> Result<Word> {
    let sql = format!(
        "SELECT {} FROM words WHERE id = ? {}",
        WORD_COLUMNS,
        if include_deleted { "" } else { "AND deleted_at IS NULL" }
    );
    sqlx::query_as::<_, WordRow>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await?
        .map(Word::from)
        .ok_or_else(|| Error::NotFound(format!("Word {} not found", id)))
}

/// Look up a live word by its hangul
pub async fn find_word_by_hangul<'e>(
    ex: impl SqliteExecutor<'e>,
    hangul: &str,
) -> Result<Option<Word>> {
    let sql = format!(
        "SELECT {} FROM words WHERE hangul = ? AND deleted_at IS NULL",
        WORD_COLUMNS
    );
    let row = sqlx::query_as::<_, WordRow>(&sql)
        .bind(hangul.trim())
        .fetch_optional(ex)
        .await?;
    Ok(row.map(Word::from))
}

/// Apply a partial update to a live word
pub async fn update_word(db: &Database, id: i64, update: &WordUpdate) -> Result<Word> {
    let mut tx = db.begin_write().await?;
    let current = get_word(tx.conn(), id).await?;

    let hangul = update
        .hangul
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.hangul)
        .to_string();
    let romanization = update.romanization.clone().unwrap_or(current.romanization);
    let part_of_speech = update.part_of_speech.clone().unwrap_or(current.part_of_speech);
    let english = update.english.clone().unwrap_or(current.english);
    let example = update
        .example
        .clone()
        .or(current.example)
        .unwrap_or_default();
    validate_fields(&hangul, &english)?;

    sqlx::query(
        r#"
        UPDATE words
        SET hangul = ?, romanization = ?, part_of_speech = ?, english = ?,
            example_korean = ?, example_english = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&hangul)
    .bind(&romanization)
    .bind(&part_of_speech)
    .bind(Json(&english))
    .bind(&example.korean)
    .bind(&example.english)
    .bind(now())
    .bind(id)
    .execute(tx.conn())
    .await
    .map_err(|e| {
        classify_write(
            e,
            &format!("Word '{}' already exists", hangul),
            "Referenced record not found",
        )
    })?;

    let updated = get_word(tx.conn(), id).await?;
    tx.commit().await?;
    Ok(updated)
}

/// Soft-delete a word
///
/// Its group links are removed and the affected groups' counts recomputed in
/// the same transaction.
pub async fn delete_word(db: &Database, id: i64) -> Result<()> {
    let mut tx = db.begin_write().await?;
    get_word(tx.conn(), id).await?;

    let group_ids: Vec<i64> = sqlx::query_scalar("SELECT group_id FROM word_groups WHERE word_id = ?")
        .bind(id)
        .fetch_all(tx.conn())
        .await?;

    let ts = now();
    sqlx::query("UPDATE words SET deleted_at = ?, updated_at = ? WHERE id = ?")
        .bind(ts)
        .bind(ts)
        .bind(id)
        .execute(tx.conn())
        .await?;

    sqlx::query("DELETE FROM word_groups WHERE word_id = ?")
        .bind(id)
        .execute(tx.conn())
        .await?;

    for group_id in group_ids {
        refresh_words_count(tx.conn(), group_id).await?;
    }

    tx.commit().await?;
    debug!("Soft-deleted word {}", id);
    Ok(())
}

/// Number of live words
pub async fn count_words<'e>(ex: impl SqliteExecutor<'e>) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM words WHERE deleted_at IS NULL")
        .fetch_one(ex)
        .await?;
    Ok(count)
}

/// Live groups a word belongs to, ordered by name
pub async fn groups_of_word<'e>(ex: impl SqliteExecutor<'e>, word_id: i64) -> Result<Vec<Group>> {
    let groups = sqlx::query_as::<_, Group>(
        r#"
        SELECT g.id, g.name, g.description, g.words_count, g.created_at, g.updated_at, g.deleted_at
        FROM groups g
        JOIN word_groups wg ON wg.group_id = g.id
        WHERE wg.word_id = ? AND g.deleted_at IS NULL
        ORDER BY g.name
        "#,
    )
    .bind(word_id)
    .fetch_all(ex)
    .await?;
    Ok(groups)
}
