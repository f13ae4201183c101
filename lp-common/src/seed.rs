//! Corpus seeding and store resets
//!
//! The corpus lives in a seed directory:
//! - `data_korean.json`: array of words
//! - `word_groups.json`: either `{"groups": {<name>: {description, words}}}`
//!   or a flat `[{hangul, group_names}]` list; the shape is detected from the
//!   root JSON value
//!
//! Seeding and resets hold the writer lock and run in a single transaction,
//! so no other write interleaves and a failure leaves the store as it was.

use crate::db::activities::{find_activity_by_name, insert_activity};
use crate::db::groups::{find_group_by_name, insert_group, insert_link, refresh_all_words_counts};
use crate::db::words::{find_word_by_hangul, insert_word};
use crate::db::{
    create_schema, drop_all_tables, ActivityType, Database, ExampleSentence, NewGroup,
    NewStudyActivity, NewWord,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{SqliteConnection, SqliteExecutor};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

pub const WORDS_FILE: &str = "data_korean.json";
pub const GROUPS_FILE: &str = "word_groups.json";

/// English translations given either as one string or a list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum Translations {
    One(String),
    Many(Vec<String>),
}

impl From<Translations> for Vec<String> {
    fn from(t: Translations) -> Self {
        match t {
            Translations::One(s) => vec![s],
            Translations::Many(v) => v,
        }
    }
}

/// Word record from `data_korean.json`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CorpusWord {
    pub hangul: String,
    #[serde(default)]
    pub romanization: String,
    #[serde(default, rename = "type")]
    pub part_of_speech: String,
    #[serde(default, deserialize_with = "translations")]
    pub english: Vec<String>,
    #[serde(default)]
    pub example_sentence: Option<ExampleSentence>,
}

impl From<&CorpusWord> for NewWord {
    fn from(w: &CorpusWord) -> Self {
        NewWord {
            hangul: w.hangul.clone(),
            romanization: w.romanization.clone(),
            part_of_speech: w.part_of_speech.clone(),
            english: w.english.clone(),
            example: w.example_sentence.clone(),
        }
    }
}

fn translations<'de, D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Vec<String>, D::Error> {
    Ok(Translations::deserialize(d)?.into())
}

/// Word listed inside a nested group
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupWord {
    pub hangul: String,
    #[serde(default)]
    pub romanization: String,
    #[serde(default, deserialize_with = "translations")]
    pub english: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct NestedGroupBody {
    #[serde(default)]
    description: String,
    #[serde(default)]
    words: Vec<GroupWord>,
}

/// Group defined with its member words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedGroup {
    pub name: String,
    pub description: String,
    pub words: Vec<GroupWord>,
}

/// Flat membership record: one word and the groups it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupMapping {
    pub hangul: String,
    #[serde(default)]
    pub group_names: Vec<String>,
}

/// Parsed `word_groups.json`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupCorpus {
    Nested(Vec<NestedGroup>),
    Flat(Vec<GroupMapping>),
}

/// Both seed documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    pub words: Vec<CorpusWord>,
    pub groups: GroupCorpus,
}

/// Counts of what a seeding pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub activities_created: usize,
    pub words_created: usize,
    pub words_existing: usize,
    pub groups_created: usize,
    pub links_created: usize,
    pub mappings_skipped: usize,
}

/// What [`init_and_seed`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Seeded(SeedReport),
    AlreadyPopulated,
}

/// Live row counts of every table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub words: i64,
    pub groups: i64,
    pub word_group_links: i64,
    pub study_activities: i64,
    pub study_sessions: i64,
    pub word_reviews: i64,
    pub sentence_practice_attempts: i64,
}

/// The three activities every store carries
pub fn canonical_activities() -> Vec<NewStudyActivity> {
    vec![
        NewStudyActivity {
            name: "Flashcards".to_string(),
            description: "Practice words with flashcards".to_string(),
            activity_type: ActivityType::Flashcards,
            thumbnail_url: "/images/flashcards.png".to_string(),
            launch_url: "/study/flashcards".to_string(),
        },
        NewStudyActivity {
            name: "Multiple Choice".to_string(),
            description: "Practice with multiple choice questions".to_string(),
            activity_type: ActivityType::MultipleChoice,
            thumbnail_url: "/images/multiple-choice.png".to_string(),
            launch_url: "/study/multiple-choice".to_string(),
        },
        NewStudyActivity {
            name: "Sentence Practice".to_string(),
            description: "Practice constructing sentences".to_string(),
            activity_type: ActivityType::SentencePractice,
            thumbnail_url: "/images/sentence-practice.png".to_string(),
            launch_url: "/study/sentence-practice".to_string(),
        },
    ]
}

/// Parse the word corpus
pub fn parse_words(text: &str) -> Result<Vec<CorpusWord>> {
    serde_json::from_str(text).map_err(|e| Error::Seed(format!("{}: {}", WORDS_FILE, e)))
}

/// Parse the group corpus, detecting its shape from the root value
pub fn parse_group_corpus(text: &str) -> Result<GroupCorpus> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| Error::Seed(format!("{}: {}", GROUPS_FILE, e)))?;
    group_corpus_from_value(value)
}

fn group_corpus_from_value(value: Value) -> Result<GroupCorpus> {
    match value {
        Value::Object(mut root) => {
            let groups = root.remove("groups").ok_or_else(|| {
                Error::Seed(format!("{}: object form needs a 'groups' key", GROUPS_FILE))
            })?;
            let groups: BTreeMap<String, NestedGroupBody> = serde_json::from_value(groups)
                .map_err(|e| Error::Seed(format!("{}: {}", GROUPS_FILE, e)))?;
            Ok(GroupCorpus::Nested(
                groups
                    .into_iter()
                    .map(|(name, body)| NestedGroup {
                        name,
                        description: body.description,
                        words: body.words,
                    })
                    .collect(),
            ))
        }
        Value::Array(_) => {
            let mappings: Vec<GroupMapping> = serde_json::from_value(value)
                .map_err(|e| Error::Seed(format!("{}: {}", GROUPS_FILE, e)))?;
            Ok(GroupCorpus::Flat(mappings))
        }
        _ => Err(Error::Seed(format!(
            "{}: expected an object with 'groups' or an array",
            GROUPS_FILE
        ))),
    }
}

/// Read both corpus files from `seed_dir`
pub async fn load_corpus(seed_dir: &Path) -> Result<Corpus> {
    let words_path = seed_dir.join(WORDS_FILE);
    let groups_path = seed_dir.join(GROUPS_FILE);

    let words_text = tokio::fs::read_to_string(&words_path)
        .await
        .map_err(|e| Error::Seed(format!("Cannot read {}: {}", words_path.display(), e)))?;
    let groups_text = tokio::fs::read_to_string(&groups_path)
        .await
        .map_err(|e| Error::Seed(format!("Cannot read {}: {}", groups_path.display(), e)))?;

    Ok(Corpus {
        words: parse_words(&words_text)?,
        groups: parse_group_corpus(&groups_text)?,
    })
}

/// Create the schema and, if the store holds no words, groups or
/// activities, load the corpus from `seed_dir`
pub async fn init_and_seed(db: &Database, seed_dir: &Path) -> Result<InitOutcome> {
    let mut tx = db.begin_write().await?;
    create_schema(tx.conn()).await?;

    let counts = store_counts(tx.conn()).await?;
    if counts.words > 0 || counts.groups > 0 || counts.study_activities > 0 {
        info!(
            "Store already populated ({} words, {} groups, {} activities), skipping seed",
            counts.words, counts.groups, counts.study_activities
        );
        tx.commit().await?;
        return Ok(InitOutcome::AlreadyPopulated);
    }

    let corpus = load_corpus(seed_dir).await?;
    let report = apply_corpus(tx.conn(), &corpus).await?;
    tx.commit().await?;

    log_report(&report);
    Ok(InitOutcome::Seeded(report))
}

/// Load the corpus into the store, skipping entities that already exist
pub async fn seed(db: &Database, seed_dir: &Path) -> Result<SeedReport> {
    let corpus = load_corpus(seed_dir).await?;
    seed_corpus(db, &corpus).await
}

/// Load an already-parsed corpus, skipping entities that already exist
pub async fn seed_corpus(db: &Database, corpus: &Corpus) -> Result<SeedReport> {
    let mut tx = db.begin_write().await?;
    create_schema(tx.conn()).await?;
    let report = apply_corpus(tx.conn(), corpus).await?;
    tx.commit().await?;

    log_report(&report);
    Ok(report)
}

/// Remove every session, review and sentence attempt
pub async fn reset_history(db: &Database) -> Result<()> {
    let mut tx = db.begin_write().await?;
    for table in ["word_reviews", "sentence_practice_attempts", "study_sessions"] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(tx.conn())
            .await?;
    }
    tx.commit().await?;
    info!("Study history reset");
    Ok(())
}

/// Drop and recreate every table, leaving only the canonical activities
pub async fn full_reset(db: &Database) -> Result<()> {
    let mut tx = db.begin_write().await?;
    drop_all_tables(tx.conn()).await?;
    create_schema(tx.conn()).await?;
    let created = ensure_canonical_activities(tx.conn()).await?;
    tx.commit().await?;
    info!("Full reset complete ({} activities created)", created);
    Ok(())
}

async fn ensure_canonical_activities(conn: &mut SqliteConnection) -> Result<usize> {
    let mut created = 0;
    for activity in canonical_activities() {
        if find_activity_by_name(&mut *conn, &activity.name).await?.is_none() {
            insert_activity(&mut *conn, &activity).await?;
            created += 1;
        }
    }
    Ok(created)
}

async fn find_or_create_word(
    conn: &mut SqliteConnection,
    word: &NewWord,
    report: &mut SeedReport,
) -> Result<i64> {
    if let Some(existing) = find_word_by_hangul(&mut *conn, &word.hangul).await? {
        report.words_existing += 1;
        return Ok(existing.id);
    }
    create_seed_word(conn, word, report).await
}

async fn create_seed_word(
    conn: &mut SqliteConnection,
    word: &NewWord,
    report: &mut SeedReport,
) -> Result<i64> {
    let id = insert_word(conn, word).await.map_err(|e| match e {
        Error::InvalidInput(msg) => Error::Seed(format!("word '{}': {}", word.hangul, msg)),
        other => other,
    })?;
    report.words_created += 1;
    Ok(id)
}

async fn find_or_create_group(
    conn: &mut SqliteConnection,
    name: &str,
    description: &str,
    report: &mut SeedReport,
) -> Result<i64> {
    if let Some(existing) = find_group_by_name(&mut *conn, name).await? {
        return Ok(existing.id);
    }
    let group = NewGroup {
        name: name.to_string(),
        description: description.to_string(),
    };
    let id = insert_group(conn, &group).await.map_err(|e| match e {
        Error::InvalidInput(msg) => Error::Seed(format!("group '{}': {}", name, msg)),
        other => other,
    })?;
    report.groups_created += 1;
    Ok(id)
}

async fn apply_corpus(conn: &mut SqliteConnection, corpus: &Corpus) -> Result<SeedReport> {
    let mut report = SeedReport {
        activities_created: ensure_canonical_activities(&mut *conn).await?,
        ..SeedReport::default()
    };

    for word in &corpus.words {
        find_or_create_word(&mut *conn, &NewWord::from(word), &mut report).await?;
    }

    match &corpus.groups {
        GroupCorpus::Nested(groups) => {
            for group in groups {
                let group_id =
                    find_or_create_group(&mut *conn, &group.name, &group.description, &mut report)
                        .await?;
                for member in &group.words {
                    let word_id = match find_word_by_hangul(&mut *conn, &member.hangul).await? {
                        Some(existing) => existing.id,
                        None if member.english.iter().all(|e| e.trim().is_empty()) => {
                            warn!(
                                "Skipping '{}' in group '{}': not in corpus and no translation",
                                member.hangul, group.name
                            );
                            report.mappings_skipped += 1;
                            continue;
                        }
                        None => {
                            // Words known only from the group file get an empty type
                            let new_word = NewWord {
                                hangul: member.hangul.clone(),
                                romanization: member.romanization.clone(),
                                english: member.english.clone(),
                                ..NewWord::default()
                            };
                            create_seed_word(&mut *conn, &new_word, &mut report).await?
                        }
                    };
                    if insert_link(&mut *conn, word_id, group_id).await? {
                        report.links_created += 1;
                    }
                }
            }
        }
        GroupCorpus::Flat(mappings) => {
            for mapping in mappings {
                let Some(word) = find_word_by_hangul(&mut *conn, &mapping.hangul).await? else {
                    warn!("Skipping group mapping for unknown word '{}'", mapping.hangul);
                    report.mappings_skipped += 1;
                    continue;
                };
                for name in &mapping.group_names {
                    let group_id = find_or_create_group(&mut *conn, name, "", &mut report).await?;
                    if insert_link(&mut *conn, word.id, group_id).await? {
                        report.links_created += 1;
                    }
                }
            }
        }
    }

    refresh_all_words_counts(conn).await?;
    Ok(report)
}

fn log_report(report: &SeedReport) {
    info!(
        "Seeded {} words ({} already present), {} groups, {} links, {} activities",
        report.words_created,
        report.words_existing,
        report.groups_created,
        report.links_created,
        report.activities_created
    );
    if report.mappings_skipped > 0 {
        warn!("{} group memberships were skipped", report.mappings_skipped);
    }
}

/// Count live rows in every table of `db`
pub async fn inspect(db: &Database) -> Result<StoreCounts> {
    let mut conn = db.pool().acquire().await?;
    store_counts(&mut conn).await
}

/// Count live rows in every table
pub async fn store_counts(conn: &mut SqliteConnection) -> Result<StoreCounts> {
    Ok(StoreCounts {
        words: count(&mut *conn, "SELECT COUNT(*) FROM words WHERE deleted_at IS NULL").await?,
        groups: count(&mut *conn, "SELECT COUNT(*) FROM groups WHERE deleted_at IS NULL").await?,
        word_group_links: count(&mut *conn, "SELECT COUNT(*) FROM word_groups").await?,
        study_activities: count(
            &mut *conn,
            "SELECT COUNT(*) FROM study_activities WHERE deleted_at IS NULL",
        )
        .await?,
        study_sessions: count(
            &mut *conn,
            "SELECT COUNT(*) FROM study_sessions WHERE deleted_at IS NULL",
        )
        .await?,
        word_reviews: count(
            &mut *conn,
            "SELECT COUNT(*) FROM word_reviews WHERE deleted_at IS NULL",
        )
        .await?,
        sentence_practice_attempts: count(
            &mut *conn,
            "SELECT COUNT(*) FROM sentence_practice_attempts WHERE deleted_at IS NULL",
        )
        .await?,
    })
}

async fn count<'e>(ex: impl SqliteExecutor<'e>, sql: &str) -> Result<i64> {
    let n: i64 = sqlx::query_scalar(sql).fetch_one(ex).await?;
    Ok(n)
}
