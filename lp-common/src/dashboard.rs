//! Dashboard aggregation
//!
//! Figures are computed from persisted sessions and reviews on every call.
//! Each figure comes from its own query, so one dashboard response may mix
//! figures from different committed states. Reviews belonging to
//! soft-deleted sessions never count.

use crate::db::models::percentage;
use crate::time::date_in;
use crate::Result;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};

/// Correct/wrong tallies of a set of reviews
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ReviewStats {
    pub correct_count: i64,
    pub wrong_count: i64,
}

impl ReviewStats {
    pub fn total(&self) -> i64 {
        self.correct_count + self.wrong_count
    }

    pub fn success_rate(&self) -> f64 {
        percentage(self.correct_count, self.total())
    }
}

/// Most recently completed session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastStudySession {
    pub id: i64,
    pub group_id: i64,
    pub group_name: String,
    pub study_activity_id: i64,
    pub activity_name: String,
    #[serde(rename = "timestamp")]
    pub completed_at: DateTime<Utc>,
    pub stats: ReviewStats,
}

#[derive(sqlx::FromRow)]
struct LastSessionRow {
    id: i64,
    group_id: i64,
    group_name: String,
    study_activity_id: i64,
    activity_name: String,
    completed_at: DateTime<Utc>,
    #[sqlx(flatten)]
    stats: ReviewStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyProgress {
    pub words_studied: i64,
    pub total_words: i64,
    pub mastery_progress: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickStats {
    pub success_rate: f64,
    pub total_sessions: i64,
    pub total_active_groups: i64,
    pub study_streak: u32,
}

/// Everything the dashboard page shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub last_study_session: Option<LastStudySession>,
    pub study_progress: StudyProgress,
    pub quick_stats: QuickStats,
}

const LIVE_REVIEWS: &str = r#"
    FROM word_reviews r
    JOIN study_sessions s ON s.id = r.study_session_id
    WHERE r.deleted_at IS NULL AND s.deleted_at IS NULL
"#;

/// Completed live session with the latest `completed_at` (ties: highest id)
pub async fn last_study_session<'e>(
    ex: impl SqliteExecutor<'e>,
) -> Result<Option<LastStudySession>> {
    let row = sqlx::query_as::<_, LastSessionRow>(
        r#"
        SELECT s.id, s.group_id, g.name AS group_name,
               s.study_activity_id, a.name AS activity_name, s.completed_at,
               (SELECT COUNT(*) FROM word_reviews r
                WHERE r.study_session_id = s.id AND r.deleted_at IS NULL AND r.correct = 1)
                   AS correct_count,
               (SELECT COUNT(*) FROM word_reviews r
                WHERE r.study_session_id = s.id AND r.deleted_at IS NULL AND r.correct = 0)
                   AS wrong_count
        FROM study_sessions s
        JOIN groups g ON g.id = s.group_id
        JOIN study_activities a ON a.id = s.study_activity_id
        WHERE s.deleted_at IS NULL AND s.completed_at IS NOT NULL
        ORDER BY s.completed_at DESC, s.id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(ex)
    .await?;

    Ok(row.map(|r| LastStudySession {
        id: r.id,
        group_id: r.group_id,
        group_name: r.group_name,
        study_activity_id: r.study_activity_id,
        activity_name: r.activity_name,
        completed_at: r.completed_at,
        stats: r.stats,
    }))
}

/// Tallies of every live review
pub async fn overall_review_stats<'e>(ex: impl SqliteExecutor<'e>) -> Result<ReviewStats> {
    let sql = format!(
        "SELECT COALESCE(SUM(CASE WHEN r.correct = 1 THEN 1 ELSE 0 END), 0) AS correct_count, \
                COALESCE(SUM(CASE WHEN r.correct = 0 THEN 1 ELSE 0 END), 0) AS wrong_count {}",
        LIVE_REVIEWS
    );
    let stats = sqlx::query_as::<_, ReviewStats>(&sql).fetch_one(ex).await?;
    Ok(stats)
}

/// Tallies of one session's live reviews
pub async fn session_review_stats<'e>(
    ex: impl SqliteExecutor<'e>,
    study_session_id: i64,
) -> Result<ReviewStats> {
    let stats = sqlx::query_as::<_, ReviewStats>(
        r#"
        SELECT COALESCE(SUM(CASE WHEN correct = 1 THEN 1 ELSE 0 END), 0) AS correct_count,
               COALESCE(SUM(CASE WHEN correct = 0 THEN 1 ELSE 0 END), 0) AS wrong_count
        FROM word_reviews
        WHERE study_session_id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(study_session_id)
    .fetch_one(ex)
    .await?;
    Ok(stats)
}

pub async fn study_progress(pool: &SqlitePool) -> Result<StudyProgress> {
    let total_words: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM words WHERE deleted_at IS NULL")
            .fetch_one(pool)
            .await?;

    let words_studied: i64 =
        sqlx::query_scalar(&format!("SELECT COUNT(DISTINCT r.word_id) {}", LIVE_REVIEWS))
            .fetch_one(pool)
            .await?;

    let stats = overall_review_stats(pool).await?;

    Ok(StudyProgress {
        words_studied,
        total_words,
        mastery_progress: stats.success_rate(),
    })
}

pub async fn quick_stats(pool: &SqlitePool) -> Result<QuickStats> {
    let stats = overall_review_stats(pool).await?;

    let total_sessions: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM study_sessions WHERE deleted_at IS NULL")
            .fetch_one(pool)
            .await?;

    let total_active_groups: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM groups WHERE deleted_at IS NULL AND words_count > 0",
    )
    .fetch_one(pool)
    .await?;

    let completions: Vec<DateTime<Utc>> = sqlx::query_scalar(
        "SELECT completed_at FROM study_sessions WHERE deleted_at IS NULL AND completed_at IS NOT NULL",
    )
    .fetch_all(pool)
    .await?;

    Ok(QuickStats {
        success_rate: stats.success_rate(),
        total_sessions,
        total_active_groups,
        study_streak: study_streak(&completions, &Local),
    })
}

pub async fn dashboard(pool: &SqlitePool) -> Result<Dashboard> {
    Ok(Dashboard {
        last_study_session: last_study_session(pool).await?,
        study_progress: study_progress(pool).await?,
        quick_stats: quick_stats(pool).await?,
    })
}

/// Length of the run of consecutive calendar days ending on the latest
/// completion date, with days taken in `tz`
pub fn study_streak<Tz: TimeZone>(completions: &[DateTime<Utc>], tz: &Tz) -> u32 {
    let mut dates: Vec<NaiveDate> = completions.iter().map(|ts| date_in(*ts, tz)).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let mut iter = dates.into_iter();
    let Some(mut previous) = iter.next() else {
        return 0;
    };

    let mut streak = 1;
    for date in iter {
        if previous.pred_opt() != Some(date) {
            break;
        }
        streak += 1;
        previous = date;
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_streak_empty() {
        assert_eq!(study_streak(&[], &Utc), 0);
    }

    #[test]
    fn test_streak_single_day_many_sessions() {
        let day = noon(2024, 5, 10);
        let sessions = [day, day + Duration::hours(2), day - Duration::hours(3)];
        assert_eq!(study_streak(&sessions, &Utc), 1);
    }

    #[test]
    fn test_streak_stops_at_gap() {
        let d = noon(2024, 5, 10);
        let sessions = [d, d - Duration::days(1), d - Duration::days(3)];
        assert_eq!(study_streak(&sessions, &Utc), 2);
    }

    #[test]
    fn test_streak_gap_filled() {
        let d = noon(2024, 5, 10);
        let sessions = [
            d - Duration::days(3),
            d,
            d - Duration::days(2),
            d - Duration::days(1),
        ];
        assert_eq!(study_streak(&sessions, &Utc), 4);
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let sessions = [noon(2024, 3, 1), noon(2024, 2, 29), noon(2024, 2, 28)];
        assert_eq!(study_streak(&sessions, &Utc), 3);
    }

    #[test]
    fn test_streak_uses_given_time_zone() {
        // Both fall on March 2nd in Seoul but on consecutive UTC days
        let evening = Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap();
        let morning = Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap();
        let seoul = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(study_streak(&[evening, morning], &Utc), 2);
        assert_eq!(study_streak(&[evening, morning], &seoul), 1);
    }

    #[test]
    fn test_streak_today_never_decreases() {
        let today = noon(2024, 5, 10);
        let histories: Vec<Vec<DateTime<Utc>>> = vec![
            vec![],
            vec![today],
            vec![today - Duration::days(1)],
            vec![today - Duration::days(1), today - Duration::days(2)],
            vec![today, today - Duration::days(1), today - Duration::days(3)],
        ];
        for history in histories {
            let before = study_streak(&history, &Utc);
            let mut after = history.clone();
            after.push(today);
            assert!(study_streak(&after, &Utc) >= before, "history {:?}", history);
        }
    }

    #[test]
    fn test_review_stats_success_rate() {
        let stats = ReviewStats {
            correct_count: 3,
            wrong_count: 1,
        };
        assert_eq!(stats.total(), 4);
        assert_eq!(stats.success_rate(), 75.0);
        assert_eq!(ReviewStats::default().success_rate(), 0.0);
    }
}
