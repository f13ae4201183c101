//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::fmt;
use std::str::FromStr;

/// Example sentence embedded in a word
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleSentence {
    pub korean: String,
    pub english: String,
}

impl ExampleSentence {
    /// Both fields empty means "no example"
    pub fn is_empty(&self) -> bool {
        self.korean.is_empty() && self.english.is_empty()
    }
}

/// Raw `words` row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WordRow {
    pub id: i64,
    pub hangul: String,
    pub romanization: String,
    pub part_of_speech: String,
    pub english: Json<Vec<String>>,
    pub example_korean: String,
    pub example_english: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Vocabulary word
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Word {
    pub id: i64,
    pub hangul: String,
    pub romanization: String,
    #[serde(rename = "type")]
    pub part_of_speech: String,
    pub english: Vec<String>,
    pub example: Option<ExampleSentence>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<WordRow> for Word {
    fn from(row: WordRow) -> Self {
        let example = ExampleSentence {
            korean: row.example_korean,
            english: row.example_english,
        };
        Self {
            id: row.id,
            hangul: row.hangul,
            romanization: row.romanization,
            part_of_speech: row.part_of_speech,
            english: row.english.0,
            example: (!example.is_empty()).then_some(example),
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Word plus its review tallies
#[derive(Debug, Clone, Serialize)]
pub struct WordWithStats {
    #[serde(flatten)]
    pub word: Word,
    pub correct_count: i64,
    pub wrong_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct WordStatsRow {
    #[sqlx(flatten)]
    pub word: WordRow,
    pub correct_count: i64,
    pub wrong_count: i64,
}

impl From<WordStatsRow> for WordWithStats {
    fn from(row: WordStatsRow) -> Self {
        Self {
            word: row.word.into(),
            correct_count: row.correct_count,
            wrong_count: row.wrong_count,
        }
    }
}

/// Fields for creating a word
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewWord {
    pub hangul: String,
    #[serde(default)]
    pub romanization: String,
    #[serde(default, rename = "type")]
    pub part_of_speech: String,
    pub english: Vec<String>,
    #[serde(default)]
    pub example: Option<ExampleSentence>,
}

/// Partial update of a word; `None` leaves the field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WordUpdate {
    pub hangul: Option<String>,
    pub romanization: Option<String>,
    #[serde(rename = "type")]
    pub part_of_speech: Option<String>,
    pub english: Option<Vec<String>>,
    pub example: Option<ExampleSentence>,
}

/// Thematic word group
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub words_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewGroup {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Kind of study exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Flashcards,
    MultipleChoice,
    SentencePractice,
}

impl ActivityType {
    pub const ALL: [ActivityType; 3] = [
        ActivityType::Flashcards,
        ActivityType::MultipleChoice,
        ActivityType::SentencePractice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Flashcards => "flashcards",
            ActivityType::MultipleChoice => "multiple_choice",
            ActivityType::SentencePractice => "sentence_practice",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for ActivityType {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for ActivityType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| crate::Error::InvalidInput(format!("Unknown activity type: {}", s)))
    }
}

/// Study activity (flashcards, multiple choice, sentence practice)
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StudyActivity {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub activity_type: ActivityType,
    pub thumbnail_url: String,
    pub launch_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStudyActivity {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub launch_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudyActivityUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub launch_url: Option<String>,
}

/// One run of an activity over a group
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StudySession {
    pub id: i64,
    pub group_id: i64,
    pub study_activity_id: i64,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl StudySession {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Session with names and review statistics, as listed by the API
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StudySessionSummary {
    pub id: i64,
    pub group_id: i64,
    pub group_name: String,
    pub activity_id: i64,
    pub activity_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub review_items_count: i64,
    pub correct_count: i64,
    pub wrong_count: i64,
    #[sqlx(skip)]
    pub success_rate: f64,
}

/// Single correct/incorrect outcome within a session
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct WordReview {
    pub id: i64,
    pub study_session_id: i64,
    pub word_id: i64,
    pub correct: bool,
    pub created_at: DateTime<Utc>,
}

/// Translation attempt against a word's example sentence
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SentencePracticeAttempt {
    pub id: i64,
    pub word_id: i64,
    pub user_translation: String,
    pub correct: bool,
    pub created_at: DateTime<Utc>,
}

/// Percentage of `correct` in `total`, 0 when `total` is 0
pub fn percentage(correct: i64, total: i64) -> f64 {
    if total <= 0 {
        0.0
    } else {
        100.0 * correct as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_type_round_trips_through_str() {
        for t in ActivityType::ALL {
            assert_eq!(t.as_str().parse::<ActivityType>().unwrap(), t);
        }
        assert!("karaoke".parse::<ActivityType>().is_err());
    }

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 2), 50.0);
        assert_eq!(percentage(2, 3), 200.0 / 3.0);
    }
}
