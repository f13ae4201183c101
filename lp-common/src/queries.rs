//! Read-side queries used by the HTTP layer
//!
//! All reads skip soft-deleted rows. Child listings of a missing parent fail
//! with [`Error::NotFound`]; an existing parent without children yields an
//! empty page.

use crate::db::activities::{get_activity, ACTIVITY_COLUMNS};
use crate::db::groups::{get_group, GROUP_COLUMNS};
use crate::db::sessions::{count_sessions, get_session_summary, list_session_summaries, SessionFilter};
use crate::db::words::{get_word, groups_of_word, WORD_COLUMNS};
use crate::db::{
    percentage, ExampleSentence, Group, StudyActivity, StudySessionSummary, WordStatsRow,
    WordWithStats,
};
use crate::pagination::{Page, PageRequest};
use crate::{Error, Result};
use rand::seq::SliceRandom;
use serde::Serialize;
use sqlx::SqlitePool;
use std::str::FromStr;

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::InvalidInput(format!(
                "order must be 'asc' or 'desc', got '{}'",
                other
            ))),
        }
    }
}

/// Sort keys for word listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WordSort {
    #[default]
    Hangul,
    Romanization,
    Type,
    CorrectCount,
    WrongCount,
}

impl WordSort {
    fn column(&self) -> &'static str {
        match self {
            WordSort::Hangul => "words.hangul",
            WordSort::Romanization => "words.romanization",
            WordSort::Type => "words.part_of_speech",
            WordSort::CorrectCount => "correct_count",
            WordSort::WrongCount => "wrong_count",
        }
    }
}

impl FromStr for WordSort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hangul" => Ok(WordSort::Hangul),
            "romanization" => Ok(WordSort::Romanization),
            "type" => Ok(WordSort::Type),
            "correct_count" => Ok(WordSort::CorrectCount),
            "wrong_count" => Ok(WordSort::WrongCount),
            other => Err(Error::InvalidInput(format!("Cannot sort words by '{}'", other))),
        }
    }
}

/// Sort keys for group listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupSort {
    #[default]
    Name,
    WordsCount,
}

impl FromStr for GroupSort {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "name" => Ok(GroupSort::Name),
            "words_count" => Ok(GroupSort::WordsCount),
            other => Err(Error::InvalidInput(format!("Cannot sort groups by '{}'", other))),
        }
    }
}

/// Validated list request: page plus sort key and direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery<S> {
    pub page: PageRequest,
    pub sort_by: S,
    pub order: SortOrder,
}

impl<S: FromStr<Err = Error> + Default> ListQuery<S> {
    /// Parse raw query parameters, applying defaults for missing ones
    pub fn parse(
        page: Option<i64>,
        per_page: Option<i64>,
        sort_by: Option<&str>,
        order: Option<&str>,
    ) -> Result<Self> {
        let defaults = PageRequest::default();
        Ok(Self {
            page: PageRequest::new(page.unwrap_or(defaults.page), per_page.unwrap_or(defaults.per_page))?,
            sort_by: sort_by.map(str::parse).transpose()?.unwrap_or_default(),
            order: order.map(str::parse).transpose()?.unwrap_or_default(),
        })
    }
}

pub type WordListQuery = ListQuery<WordSort>;
pub type GroupListQuery = ListQuery<GroupSort>;

/// Word with its groups, as shown on the word page
#[derive(Debug, Clone, Serialize)]
pub struct WordDetails {
    #[serde(flatten)]
    pub word: WordWithStats,
    pub groups: Vec<Group>,
}

/// Example sentence matched by a word lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct SentenceExample {
    pub word_id: i64,
    pub hangul: String,
    pub korean: String,
    pub english: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentenceStatistics {
    pub total_sentences_attempted: i64,
    pub correct_answers: i64,
    pub accuracy_rate: f64,
}

/// Word data shown alongside a practice sentence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeWord {
    pub hangul: String,
    pub romanization: String,
    pub english: Vec<String>,
}

/// Sentence offered for translation practice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeSentence {
    /// Id of the word owning the sentence; attempts are posted against it
    pub sentence_id: i64,
    pub word: PracticeWord,
    pub example_sentence: ExampleSentence,
}

const REVIEW_TALLIES: &str = r#"
    LEFT JOIN (
        SELECT r.word_id,
               SUM(CASE WHEN r.correct = 1 THEN 1 ELSE 0 END) AS correct_count,
               SUM(CASE WHEN r.correct = 0 THEN 1 ELSE 0 END) AS wrong_count
        FROM word_reviews r
        JOIN study_sessions s ON s.id = r.study_session_id
        WHERE r.deleted_at IS NULL AND s.deleted_at IS NULL
        GROUP BY r.word_id
    ) tallies ON tallies.word_id = words.id
"#;

async fn fetch_words(
    pool: &SqlitePool,
    group_id: Option<i64>,
    query: &WordListQuery,
) -> Result<Page<WordWithStats>> {
    let membership = if group_id.is_some() {
        "JOIN word_groups wg ON wg.word_id = words.id AND wg.group_id = ?"
    } else {
        ""
    };

    let count_sql = format!(
        "SELECT COUNT(*) FROM words {} WHERE words.deleted_at IS NULL",
        membership
    );
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(id) = group_id {
        count_query = count_query.bind(id);
    }
    let total = count_query.fetch_one(pool).await?;

    let sql = format!(
        r#"
        SELECT {},
               COALESCE(tallies.correct_count, 0) AS correct_count,
               COALESCE(tallies.wrong_count, 0) AS wrong_count
        FROM words
        {}
        {}
        WHERE words.deleted_at IS NULL
        ORDER BY {} {}, words.id ASC
        LIMIT ? OFFSET ?
        "#,
        WORD_COLUMNS,
        membership,
        REVIEW_TALLIES,
        query.sort_by.column(),
        query.order.sql()
    );
    let mut rows_query = sqlx::query_as::<_, WordStatsRow>(&sql);
    if let Some(id) = group_id {
        rows_query = rows_query.bind(id);
    }
    let rows = rows_query
        .bind(query.page.limit())
        .bind(query.page.offset())
        .fetch_all(pool)
        .await?;

    Ok(Page::new(
        rows.into_iter().map(WordWithStats::from).collect(),
        total,
        query.page,
    ))
}

/// Page of live words with review tallies
pub async fn list_words(pool: &SqlitePool, query: &WordListQuery) -> Result<Page<WordWithStats>> {
    fetch_words(pool, None, query).await
}

/// One live word with tallies and groups
pub async fn get_word_details(pool: &SqlitePool, id: i64) -> Result<WordDetails> {
    get_word(pool, id).await?;

    let sql = format!(
        r#"
        SELECT {},
               COALESCE(tallies.correct_count, 0) AS correct_count,
               COALESCE(tallies.wrong_count, 0) AS wrong_count
        FROM words
        {}
        WHERE words.id = ? AND words.deleted_at IS NULL
        "#,
        WORD_COLUMNS, REVIEW_TALLIES
    );
    let row = sqlx::query_as::<_, WordStatsRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Word {} not found", id)))?;

    Ok(WordDetails {
        word: row.into(),
        groups: groups_of_word(pool, id).await?,
    })
}

/// Page of live groups
pub async fn list_groups(pool: &SqlitePool, query: &GroupListQuery) -> Result<Page<Group>> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM groups WHERE deleted_at IS NULL")
        .fetch_one(pool)
        .await?;

    let column = match query.sort_by {
        GroupSort::Name => "name",
        GroupSort::WordsCount => "words_count",
    };
    let sql = format!(
        "SELECT {} FROM groups WHERE deleted_at IS NULL ORDER BY {} {}, id ASC LIMIT ? OFFSET ?",
        GROUP_COLUMNS,
        column,
        query.order.sql()
    );
    let groups = sqlx::query_as::<_, Group>(&sql)
        .bind(query.page.limit())
        .bind(query.page.offset())
        .fetch_all(pool)
        .await?;

    Ok(Page::new(groups, total, query.page))
}

pub async fn get_group_by_id(pool: &SqlitePool, id: i64) -> Result<Group> {
    get_group(pool, id).await
}

/// Page of a group's live words
pub async fn group_words(
    pool: &SqlitePool,
    group_id: i64,
    query: &WordListQuery,
) -> Result<Page<WordWithStats>> {
    get_group(pool, group_id).await?;
    fetch_words(pool, Some(group_id), query).await
}

async fn fetch_sessions(
    pool: &SqlitePool,
    filter: SessionFilter,
    page: PageRequest,
) -> Result<Page<StudySessionSummary>> {
    let total = count_sessions(pool, filter).await?;
    let items = list_session_summaries(pool, filter, page.limit(), page.offset()).await?;
    Ok(Page::new(items, total, page))
}

/// Page of a group's sessions, newest first
pub async fn group_sessions(
    pool: &SqlitePool,
    group_id: i64,
    page: PageRequest,
) -> Result<Page<StudySessionSummary>> {
    get_group(pool, group_id).await?;
    fetch_sessions(pool, SessionFilter::Group(group_id), page).await
}

/// All live activities, by id
pub async fn list_activities(pool: &SqlitePool) -> Result<Vec<StudyActivity>> {
    let sql = format!(
        "SELECT {} FROM study_activities WHERE deleted_at IS NULL ORDER BY id",
        ACTIVITY_COLUMNS
    );
    let activities = sqlx::query_as::<_, StudyActivity>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(activities)
}

pub async fn get_activity_by_id(pool: &SqlitePool, id: i64) -> Result<StudyActivity> {
    get_activity(pool, id).await
}

/// Page of an activity's sessions, newest first
pub async fn activity_sessions(
    pool: &SqlitePool,
    activity_id: i64,
    page: PageRequest,
) -> Result<Page<StudySessionSummary>> {
    get_activity(pool, activity_id).await?;
    fetch_sessions(pool, SessionFilter::Activity(activity_id), page).await
}

/// Page of every live session, newest first
pub async fn list_sessions(
    pool: &SqlitePool,
    page: PageRequest,
) -> Result<Page<StudySessionSummary>> {
    fetch_sessions(pool, SessionFilter::All, page).await
}

pub async fn get_session_by_id(pool: &SqlitePool, id: i64) -> Result<StudySessionSummary> {
    get_session_summary(pool, id).await
}

/// Example sentences of live words whose hangul or romanization equals `query`
pub async fn sentence_examples(pool: &SqlitePool, query: &str) -> Result<Vec<SentenceExample>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(Error::InvalidInput("word parameter is required".to_string()));
    }

    let examples = sqlx::query_as::<_, SentenceExample>(
        r#"
        SELECT id AS word_id, hangul, example_korean AS korean, example_english AS english
        FROM words
        WHERE deleted_at IS NULL
          AND (hangul = ? OR romanization = ?)
          AND (example_korean != '' OR example_english != '')
        ORDER BY id
        "#,
    )
    .bind(query)
    .bind(query)
    .fetch_all(pool)
    .await?;
    Ok(examples)
}

/// Totals and accuracy over live sentence attempts
pub async fn sentence_statistics(pool: &SqlitePool) -> Result<SentenceStatistics> {
    let (total, correct): (i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COALESCE(SUM(CASE WHEN correct = 1 THEN 1 ELSE 0 END), 0)
        FROM sentence_practice_attempts
        WHERE deleted_at IS NULL
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(SentenceStatistics {
        total_sentences_attempted: total,
        correct_answers: correct,
        accuracy_rate: percentage(correct, total),
    })
}

/// Random live word that has an example sentence
pub async fn random_practice_sentence(pool: &SqlitePool) -> Result<PracticeSentence> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT id FROM words WHERE deleted_at IS NULL AND example_korean != ''",
    )
    .fetch_all(pool)
    .await?;

    let id = ids
        .choose(&mut rand::thread_rng())
        .copied()
        .ok_or_else(|| Error::NotFound("No practice sentences available".to_string()))?;

    let word = get_word(pool, id).await?;
    Ok(PracticeSentence {
        sentence_id: word.id,
        word: PracticeWord {
            hangul: word.hangul,
            romanization: word.romanization,
            english: word.english,
        },
        example_sentence: word.example.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let q = WordListQuery::parse(None, None, None, None).unwrap();
        assert_eq!(q.page, PageRequest::new(1, 100).unwrap());
        assert_eq!(q.sort_by, WordSort::Hangul);
        assert_eq!(q.order, SortOrder::Asc);
    }

    #[test]
    fn test_list_query_rejects_bad_values() {
        assert!(WordListQuery::parse(Some(0), None, None, None).is_err());
        assert!(WordListQuery::parse(None, Some(0), None, None).is_err());
        assert!(WordListQuery::parse(None, None, Some("english"), None).is_err());
        assert!(WordListQuery::parse(None, None, None, Some("sideways")).is_err());
    }

    #[test]
    fn test_order_is_case_insensitive() {
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        let q = GroupListQuery::parse(Some(2), Some(5), Some("words_count"), Some("Desc")).unwrap();
        assert_eq!(q.sort_by, GroupSort::WordsCount);
        assert_eq!(q.order, SortOrder::Desc);
        assert_eq!(q.page.offset(), 5);
    }
}
