//! Group queries and word membership
//!
//! `groups.words_count` is stored, so every change to a group's link set
//! recomputes it inside the transaction that made the change.

use super::models::{Group, GroupUpdate, NewGroup};
use super::words::get_word;
use super::Database;
use crate::error::classify_write;
use crate::time::now;
use crate::{Error, Result};
use sqlx::{SqliteConnection, SqliteExecutor};
use tracing::debug;

pub(crate) const GROUP_COLUMNS: &str =
    "id, name, description, words_count, created_at, updated_at, deleted_at";

/// Insert a group and return its id
pub async fn insert_group(conn: &mut SqliteConnection, group: &NewGroup) -> Result<i64> {
    let name = group.name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("group name must not be empty".to_string()));
    }

    let ts = now();
    let result = sqlx::query(
        "INSERT INTO groups (name, description, words_count, created_at, updated_at) VALUES (?, ?, 0, ?, ?)",
    )
    .bind(name)
    .bind(group.description.trim())
    .bind(ts)
    .bind(ts)
    .execute(conn)
    .await
    .map_err(|e| {
        classify_write(
            e,
            &format!("Group '{}' already exists", name),
            "Referenced record not found",
        )
    })?;

    Ok(result.last_insert_rowid())
}

pub async fn create_group(db: &Database, group: &NewGroup) -> Result<Group> {
    let mut tx = db.begin_write().await?;
    let id = insert_group(tx.conn(), group).await?;
    let created = get_group(tx.conn(), id).await?;
    tx.commit().await?;
    Ok(created)
}

/// Fetch a live group
pub async fn get_group<'e>(ex: impl SqliteExecutor<'e>, id: i64) -> Result<Group> {
    let sql = format!(
        "SELECT {} FROM groups WHERE id = ? AND deleted_at IS NULL",
        GROUP_COLUMNS
    );
    sqlx::query_as::<_, Group>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Group {} not found", id)))
}

pub async fn find_group_by_name<'e>(
    ex: impl SqliteExecutor<'e>,
    name: &str,
) -> Result<Option<Group>> {
    let sql = format!(
        "SELECT {} FROM groups WHERE name = ? AND deleted_at IS NULL",
        GROUP_COLUMNS
    );
    let group = sqlx::query_as::<_, Group>(&sql)
        .bind(name.trim())
        .fetch_optional(ex)
        .await?;
    Ok(group)
}

pub async fn update_group(db: &Database, id: i64, update: &GroupUpdate) -> Result<Group> {
    let mut tx = db.begin_write().await?;
    let current = get_group(tx.conn(), id).await?;

    let name = update
        .name
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.name)
        .to_string();
    if name.is_empty() {
        return Err(Error::InvalidInput("group name must not be empty".to_string()));
    }
    let description = update.description.clone().unwrap_or(current.description);

    sqlx::query("UPDATE groups SET name = ?, description = ?, updated_at = ? WHERE id = ?")
        .bind(&name)
        .bind(&description)
        .bind(now())
        .bind(id)
        .execute(tx.conn())
        .await
        .map_err(|e| {
            classify_write(
                e,
                &format!("Group '{}' already exists", name),
                "Referenced record not found",
            )
        })?;

    let updated = get_group(tx.conn(), id).await?;
    tx.commit().await?;
    Ok(updated)
}

/// Soft-delete a group and drop its word links
///
/// Fails with [`Error::Conflict`] while live sessions reference the group.
pub async fn delete_group(db: &Database, id: i64) -> Result<()> {
    let mut tx = db.begin_write().await?;
    get_group(tx.conn(), id).await?;

    let sessions: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM study_sessions WHERE group_id = ? AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_one(tx.conn())
    .await?;
    if sessions > 0 {
        return Err(Error::Conflict(format!(
            "Group {} still has {} study session(s)",
            id, sessions
        )));
    }

    sqlx::query("DELETE FROM word_groups WHERE group_id = ?")
        .bind(id)
        .execute(tx.conn())
        .await?;

    let ts = now();
    sqlx::query("UPDATE groups SET deleted_at = ?, updated_at = ?, words_count = 0 WHERE id = ?")
        .bind(ts)
        .bind(ts)
        .bind(id)
        .execute(tx.conn())
        .await?;

    tx.commit().await?;
    debug!("Soft-deleted group {}", id);
    Ok(())
}

/// Insert a link row without touching `words_count`; returns whether a row
/// was added
///
/// Callers must recompute the group's count before committing.
pub async fn insert_link(conn: &mut SqliteConnection, word_id: i64, group_id: i64) -> Result<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO word_groups (word_id, group_id, created_at) VALUES (?, ?, ?)",
    )
    .bind(word_id)
    .bind(group_id)
    .bind(now())
    .execute(conn)
    .await
    .map_err(|e| classify_write(e, "Link already exists", "Word or group not found"))?;
    Ok(result.rows_affected() > 0)
}

/// Link a word to a group and recompute the group's count; linking twice
/// is a no-op
///
/// Does not validate liveness; callers check both ends first.
pub async fn link_word(conn: &mut SqliteConnection, word_id: i64, group_id: i64) -> Result<()> {
    insert_link(&mut *conn, word_id, group_id).await?;
    refresh_words_count(conn, group_id).await
}

/// Add a live word to a live group
pub async fn add_word_to_group(db: &Database, group_id: i64, word_id: i64) -> Result<Group> {
    let mut tx = db.begin_write().await?;
    get_group(tx.conn(), group_id).await?;
    get_word(tx.conn(), word_id).await?;
    link_word(tx.conn(), word_id, group_id).await?;
    let group = get_group(tx.conn(), group_id).await?;
    tx.commit().await?;
    Ok(group)
}

/// Remove a word from a group; removing a missing link is a no-op
pub async fn remove_word_from_group(db: &Database, group_id: i64, word_id: i64) -> Result<Group> {
    let mut tx = db.begin_write().await?;
    get_group(tx.conn(), group_id).await?;

    sqlx::query("DELETE FROM word_groups WHERE word_id = ? AND group_id = ?")
        .bind(word_id)
        .bind(group_id)
        .execute(tx.conn())
        .await?;
    refresh_words_count(tx.conn(), group_id).await?;

    let group = get_group(tx.conn(), group_id).await?;
    tx.commit().await?;
    Ok(group)
}

/// Recompute `words_count` for one group from its live linked words
pub async fn refresh_words_count(conn: &mut SqliteConnection, group_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE groups
        SET words_count = (
            SELECT COUNT(*)
            FROM word_groups wg
            JOIN words w ON w.id = wg.word_id
            WHERE wg.group_id = groups.id AND w.deleted_at IS NULL
        )
        WHERE id = ?
        "#,
    )
    .bind(group_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Recompute `words_count` for every live group
pub async fn refresh_all_words_counts(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE groups
        SET words_count = (
            SELECT COUNT(*)
            FROM word_groups wg
            JOIN words w ON w.id = wg.word_id
            WHERE wg.group_id = groups.id AND w.deleted_at IS NULL
        )
        WHERE deleted_at IS NULL
        "#,
    )
    .execute(conn)
    .await?;
    Ok(())
}

/// Number of live groups
pub async fn count_groups<'e>(ex: impl SqliteExecutor<'e>) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM groups WHERE deleted_at IS NULL")
        .fetch_one(ex)
        .await?;
    Ok(count)
}

/// Groups whose stored count disagrees with their live links, as
/// `(id, name, stored, actual)`
pub async fn words_count_mismatches<'e>(
    ex: impl SqliteExecutor<'e>,
) -> Result<Vec<(i64, String, i64, i64)>> {
    let rows = sqlx::query_as::<_, (i64, String, i64, i64)>(
        r#"
        SELECT g.id, g.name, g.words_count,
               (SELECT COUNT(*) FROM word_groups wg
                JOIN words w ON w.id = wg.word_id
                WHERE wg.group_id = g.id AND w.deleted_at IS NULL) AS actual
        FROM groups g
        WHERE g.deleted_at IS NULL
        "#,
    )
    .fetch_all(ex)
    .await?;
    Ok(rows.into_iter().filter(|(_, _, stored, actual)| stored != actual).collect())
}
