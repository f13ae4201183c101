//! Study activity queries

use super::models::{NewStudyActivity, StudyActivity, StudyActivityUpdate};
use super::Database;
use crate::error::classify_write;
use crate::time::now;
use crate::{Error, Result};
use sqlx::{SqliteConnection, SqliteExecutor};

pub(crate) const ACTIVITY_COLUMNS: &str = "id, name, description, activity_type, thumbnail_url, \
    launch_url, created_at, updated_at, deleted_at";

pub async fn insert_activity(
    conn: &mut SqliteConnection,
    activity: &NewStudyActivity,
) -> Result<i64> {
    let name = activity.name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("activity name must not be empty".to_string()));
    }

    let ts = now();
    let result = sqlx::query(
        r#"
        INSERT INTO study_activities
            (name, description, activity_type, thumbnail_url, launch_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(name)
    .bind(&activity.description)
    .bind(activity.activity_type.as_str())
    .bind(&activity.thumbnail_url)
    .bind(&activity.launch_url)
    .bind(ts)
    .bind(ts)
    .execute(conn)
    .await
    .map_err(|e| {
        classify_write(
            e,
            &format!("Study activity '{}' already exists", name),
            "Referenced record not found",
        )
    })?;

    Ok(result.last_insert_rowid())
}

pub async fn create_activity(db: &Database, activity: &NewStudyActivity) -> Result<StudyActivity> {
    let mut tx = db.begin_write().await?;
    let id = insert_activity(tx.conn(), activity).await?;
    let created = get_activity(tx.conn(), id).await?;
    tx.commit().await?;
    Ok(created)
}

/// Fetch a live activity
pub async fn get_activity<'e>(ex: impl SqliteExecutor<'e>, id: i64) -> Result<StudyActivity> {
    let sql = format!(
        "SELECT {} FROM study_activities WHERE id = ? AND deleted_at IS NULL",
        ACTIVITY_COLUMNS
    );
    sqlx::query_as::<_, StudyActivity>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Study activity {} not found", id)))
}

pub async fn find_activity_by_name<'e>(
    ex: impl SqliteExecutor<'e>,
    name: &str,
) -> Result<Option<StudyActivity>> {
    let sql = format!(
        "SELECT {} FROM study_activities WHERE name = ? AND deleted_at IS NULL",
        ACTIVITY_COLUMNS
    );
    let activity = sqlx::query_as::<_, StudyActivity>(&sql)
        .bind(name.trim())
        .fetch_optional(ex)
        .await?;
    Ok(activity)
}

pub async fn update_activity(
    db: &Database,
    id: i64,
    update: &StudyActivityUpdate,
) -> Result<StudyActivity> {
    let mut tx = db.begin_write().await?;
    let current = get_activity(tx.conn(), id).await?;

    let name = update
        .name
        .as_deref()
        .map(str::trim)
        .unwrap_or(&current.name)
        .to_string();
    if name.is_empty() {
        return Err(Error::InvalidInput("activity name must not be empty".to_string()));
    }

    sqlx::query(
        r#"
        UPDATE study_activities
        SET name = ?, description = ?, thumbnail_url = ?, launch_url = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&name)
    .bind(update.description.as_ref().unwrap_or(&current.description))
    .bind(update.thumbnail_url.as_ref().unwrap_or(&current.thumbnail_url))
    .bind(update.launch_url.as_ref().unwrap_or(&current.launch_url))
    .bind(now())
    .bind(id)
    .execute(tx.conn())
    .await
    .map_err(|e| {
        classify_write(
            e,
            &format!("Study activity '{}' already exists", name),
            "Referenced record not found",
        )
    })?;

    let updated = get_activity(tx.conn(), id).await?;
    tx.commit().await?;
    Ok(updated)
}

/// Soft-delete an activity
///
/// Fails with [`Error::Conflict`] while live sessions reference it.
pub async fn delete_activity(db: &Database, id: i64) -> Result<()> {
    let mut tx = db.begin_write().await?;
    get_activity(tx.conn(), id).await?;

    let sessions: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM study_sessions WHERE study_activity_id = ? AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_one(tx.conn())
    .await?;
    if sessions > 0 {
        return Err(Error::Conflict(format!(
            "Study activity {} still has {} study session(s)",
            id, sessions
        )));
    }

    let ts = now();
    sqlx::query("UPDATE study_activities SET deleted_at = ?, updated_at = ? WHERE id = ?")
        .bind(ts)
        .bind(ts)
        .bind(id)
        .execute(tx.conn())
        .await?;

    tx.commit().await
}

pub async fn count_activities<'e>(ex: impl SqliteExecutor<'e>) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM study_activities WHERE deleted_at IS NULL")
            .fetch_one(ex)
            .await?;
    Ok(count)
}
