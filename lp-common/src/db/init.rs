//! Database initialization
//!
//! Opens (or creates) the SQLite file and creates the portal tables. Every
//! statement is idempotent, so it is safe to run on each start.

use super::Database;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqliteConnection;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Entity tables, children before parents
pub const TABLES: [&str; 7] = [
    "word_reviews",
    "sentence_practice_attempts",
    "study_sessions",
    "word_groups",
    "study_activities",
    "groups",
    "words",
];

/// Open the database file, creating it and its schema if needed
pub async fn open_database(db_path: &Path) -> Result<Database> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    let mut conn = pool.acquire().await?;
    create_schema(&mut conn).await?;
    drop(conn);

    Ok(Database::new(pool))
}

/// Create every table and index that does not exist yet
pub async fn create_schema(conn: &mut SqliteConnection) -> Result<()> {
    create_words_table(conn).await?;
    create_groups_table(conn).await?;
    create_word_groups_table(conn).await?;
    create_study_activities_table(conn).await?;
    create_study_sessions_table(conn).await?;
    create_word_reviews_table(conn).await?;
    create_sentence_practice_attempts_table(conn).await?;
    Ok(())
}

/// Drop every portal table
pub async fn drop_all_tables(conn: &mut SqliteConnection) -> Result<()> {
    for table in TABLES {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(&mut *conn)
            .await?;
    }
    info!("Dropped all tables");
    Ok(())
}

/// Whether `table` exists in the database
pub async fn table_exists(conn: &mut SqliteConnection, table: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_one(conn)
            .await?;
    Ok(count > 0)
}

async fn create_words_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS words (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            hangul TEXT NOT NULL CHECK (length(trim(hangul)) > 0),
            romanization TEXT NOT NULL DEFAULT '',
            part_of_speech TEXT NOT NULL DEFAULT '',
            english TEXT NOT NULL DEFAULT '[]',
            example_korean TEXT NOT NULL DEFAULT '',
            example_english TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            deleted_at TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    // Uniqueness only among live rows; deleted rows stay out of the index
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_words_hangul ON words(hangul) WHERE deleted_at IS NULL",
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_words_romanization ON words(romanization) WHERE deleted_at IS NULL",
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn create_groups_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS groups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(trim(name)) > 0),
            description TEXT NOT NULL DEFAULT '',
            words_count INTEGER NOT NULL DEFAULT 0,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            deleted_at TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_groups_name ON groups(name) WHERE deleted_at IS NULL",
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn create_word_groups_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS word_groups (
            word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
            group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (word_id, group_id)
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_word_groups_group ON word_groups(group_id)")
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn create_study_activities_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS study_activities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL CHECK (length(trim(name)) > 0),
            description TEXT NOT NULL DEFAULT '',
            activity_type TEXT NOT NULL
                CHECK (activity_type IN ('flashcards', 'multiple_choice', 'sentence_practice')),
            thumbnail_url TEXT NOT NULL DEFAULT '',
            launch_url TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            deleted_at TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_study_activities_name ON study_activities(name) WHERE deleted_at IS NULL",
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn create_study_sessions_table(conn: &mut SqliteConnection) -> Result<()> {
    // RESTRICT keeps a group or activity from being removed under its sessions
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS study_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            group_id INTEGER NOT NULL REFERENCES groups(id) ON DELETE RESTRICT,
            study_activity_id INTEGER NOT NULL REFERENCES study_activities(id) ON DELETE RESTRICT,
            completed_at TIMESTAMP,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            deleted_at TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_study_sessions_group ON study_sessions(group_id)")
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_study_sessions_activity ON study_sessions(study_activity_id)",
    )
    .execute(&mut *conn)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_study_sessions_completed ON study_sessions(completed_at)",
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn create_word_reviews_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS word_reviews (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            study_session_id INTEGER NOT NULL REFERENCES study_sessions(id) ON DELETE CASCADE,
            word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
            correct INTEGER NOT NULL CHECK (correct IN (0, 1)),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            deleted_at TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_word_reviews_session ON word_reviews(study_session_id)",
    )
    .execute(&mut *conn)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_word_reviews_word ON word_reviews(word_id)")
        .execute(&mut *conn)
        .await?;

    Ok(())
}

async fn create_sentence_practice_attempts_table(conn: &mut SqliteConnection) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sentence_practice_attempts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            word_id INTEGER NOT NULL REFERENCES words(id) ON DELETE CASCADE,
            user_translation TEXT NOT NULL,
            correct INTEGER NOT NULL CHECK (correct IN (0, 1)),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            deleted_at TIMESTAMP
        )
        "#,
    )
    .execute(&mut *conn)
    .await?;

    Ok(())
}
