//! Integration tests for schema creation and the entity layer
//!
//! Tests cover:
//! - Automatic database creation and idempotent schema setup
//! - Natural-key uniqueness among live rows
//! - Soft deletion hiding rows from reads
//! - `words_count` staying equal to the live linked words

use lp_common::db::activities::{create_activity, delete_activity, get_activity, update_activity};
use lp_common::db::groups::{
    add_word_to_group, create_group, delete_group, get_group, remove_word_from_group,
    update_group, words_count_mismatches,
};
use lp_common::db::words::{
    create_word, delete_word, find_word_by_hangul, get_word, get_word_including_deleted,
    update_word,
};
use lp_common::db::{
    create_schema, open_database, table_exists, ActivityType, Database, ExampleSentence,
    GroupUpdate, NewGroup, NewStudyActivity, NewWord, StudyActivityUpdate, WordUpdate, TABLES,
};
use lp_common::recorder::launch_session;
use lp_common::{Error, ErrorKind};
use tempfile::TempDir;

async fn setup() -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    let db = open_database(&dir.path().join("portal.db")).await.unwrap();
    (dir, db)
}

fn word(hangul: &str, romanization: &str, english: &str) -> NewWord {
    NewWord {
        hangul: hangul.to_string(),
        romanization: romanization.to_string(),
        part_of_speech: "noun".to_string(),
        english: vec![english.to_string()],
        example: None,
    }
}

fn group(name: &str) -> NewGroup {
    NewGroup {
        name: name.to_string(),
        description: String::new(),
    }
}

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("nested").join("portal.db");

    let db = open_database(&db_path).await;
    assert!(db.is_ok(), "Database initialization failed: {:?}", db.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_path_with_url_characters() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("odd?name#50%").join("portal.db");

    let db = open_database(&db_path).await.unwrap();
    create_word(&db, &word("학교", "hakgyo", "school")).await.unwrap();

    assert!(db_path.exists(), "Database file not created at the literal path");
}

#[tokio::test]
async fn test_all_tables_created() {
    let (_dir, db) = setup().await;
    let mut conn = db.pool().acquire().await.unwrap();
    for table in TABLES {
        assert!(table_exists(&mut conn, table).await.unwrap(), "missing table {}", table);
    }
}

#[tokio::test]
async fn test_database_opens_existing_and_keeps_data() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("portal.db");

    let db = open_database(&db_path).await.unwrap();
    create_word(&db, &word("학교", "hakgyo", "school")).await.unwrap();
    db.close().await;

    let reopened = open_database(&db_path).await.unwrap();
    let found = find_word_by_hangul(reopened.pool(), "학교").await.unwrap();
    assert!(found.is_some());

    // Creating the schema again is a no-op
    let mut conn = reopened.pool().acquire().await.unwrap();
    create_schema(&mut conn).await.unwrap();
}

#[tokio::test]
async fn test_create_and_get_word() {
    let (_dir, db) = setup().await;
    let mut new = word("학교", "hakgyo", "school");
    new.example = Some(ExampleSentence {
        korean: "나는 학교에 갑니다".to_string(),
        english: "I go to school".to_string(),
    });

    let created = create_word(&db, &new).await.unwrap();
    let fetched = get_word(db.pool(), created.id).await.unwrap();

    assert_eq!(fetched.hangul, "학교");
    assert_eq!(fetched.english, vec!["school".to_string()]);
    assert_eq!(fetched.part_of_speech, "noun");
    assert_eq!(fetched.example.unwrap().korean, "나는 학교에 갑니다");
}

#[tokio::test]
async fn test_word_without_example_has_none() {
    let (_dir, db) = setup().await;
    let created = create_word(&db, &word("사과", "sagwa", "apple")).await.unwrap();
    assert!(created.example.is_none());
}

#[tokio::test]
async fn test_duplicate_hangul_conflicts() {
    let (_dir, db) = setup().await;
    create_word(&db, &word("학교", "hakgyo", "school")).await.unwrap();

    let err = create_word(&db, &word("학교", "hakgyo2", "campus"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_hangul_reusable_after_soft_delete() {
    let (_dir, db) = setup().await;
    let first = create_word(&db, &word("학교", "hakgyo", "school")).await.unwrap();
    delete_word(&db, first.id).await.unwrap();

    let second = create_word(&db, &word("학교", "hakgyo", "school")).await.unwrap();
    assert!(second.id > first.id);
}

#[tokio::test]
async fn test_empty_word_fields_rejected() {
    let (_dir, db) = setup().await;
    let err = create_word(&db, &word("  ", "x", "y")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    let mut no_english = word("학교", "hakgyo", "school");
    no_english.english.clear();
    let err = create_word(&db, &no_english).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);
}

#[tokio::test]
async fn test_soft_deleted_word_hidden_from_reads() {
    let (_dir, db) = setup().await;
    let created = create_word(&db, &word("학교", "hakgyo", "school")).await.unwrap();
    delete_word(&db, created.id).await.unwrap();

    assert!(matches!(get_word(db.pool(), created.id).await, Err(Error::NotFound(_))));
    assert!(find_word_by_hangul(db.pool(), "학교").await.unwrap().is_none());

    let deleted = get_word_including_deleted(db.pool(), created.id).await.unwrap();
    assert!(deleted.deleted_at.is_some());
}

#[tokio::test]
async fn test_update_word_partial() {
    let (_dir, db) = setup().await;
    let created = create_word(&db, &word("학교", "hakgyo", "school")).await.unwrap();

    let updated = update_word(
        &db,
        created.id,
        &WordUpdate {
            english: Some(vec!["school".to_string(), "academy".to_string()]),
            ..WordUpdate::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.hangul, "학교");
    assert_eq!(updated.romanization, "hakgyo");
    assert_eq!(updated.english.len(), 2);
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn test_update_word_to_existing_hangul_conflicts() {
    let (_dir, db) = setup().await;
    create_word(&db, &word("학교", "hakgyo", "school")).await.unwrap();
    let apple = create_word(&db, &word("사과", "sagwa", "apple")).await.unwrap();

    let err = update_word(
        &db,
        apple.id,
        &WordUpdate {
            hangul: Some("학교".to_string()),
            ..WordUpdate::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_duplicate_group_name_conflicts() {
    let (_dir, db) = setup().await;
    create_group(&db, &group("School")).await.unwrap();
    let err = create_group(&db, &group("School")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_update_group_name() {
    let (_dir, db) = setup().await;
    let created = create_group(&db, &group("School")).await.unwrap();
    let updated = update_group(
        &db,
        created.id,
        &GroupUpdate {
            name: Some("Campus".to_string()),
            description: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "Campus");
}

#[tokio::test]
async fn test_linking_is_idempotent_and_counts() {
    let (_dir, db) = setup().await;
    let school = create_group(&db, &group("School")).await.unwrap();
    let hakgyo = create_word(&db, &word("학교", "hakgyo", "school")).await.unwrap();
    let chaek = create_word(&db, &word("책", "chaek", "book")).await.unwrap();

    add_word_to_group(&db, school.id, hakgyo.id).await.unwrap();
    let after_twice = add_word_to_group(&db, school.id, hakgyo.id).await.unwrap();
    assert_eq!(after_twice.words_count, 1);

    let after_second = add_word_to_group(&db, school.id, chaek.id).await.unwrap();
    assert_eq!(after_second.words_count, 2);

    let after_remove = remove_word_from_group(&db, school.id, chaek.id).await.unwrap();
    assert_eq!(after_remove.words_count, 1);

    assert!(words_count_mismatches(db.pool()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_linking_missing_word_is_not_found() {
    let (_dir, db) = setup().await;
    let school = create_group(&db, &group("School")).await.unwrap();
    let err = add_word_to_group(&db, school.id, 999).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = add_word_to_group(&db, 999, 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_deleting_word_updates_group_counts() {
    let (_dir, db) = setup().await;
    let school = create_group(&db, &group("School")).await.unwrap();
    let places = create_group(&db, &group("Places")).await.unwrap();
    let hakgyo = create_word(&db, &word("학교", "hakgyo", "school")).await.unwrap();
    let chaek = create_word(&db, &word("책", "chaek", "book")).await.unwrap();

    add_word_to_group(&db, school.id, hakgyo.id).await.unwrap();
    add_word_to_group(&db, school.id, chaek.id).await.unwrap();
    add_word_to_group(&db, places.id, hakgyo.id).await.unwrap();

    delete_word(&db, hakgyo.id).await.unwrap();

    assert_eq!(get_group(db.pool(), school.id).await.unwrap().words_count, 1);
    assert_eq!(get_group(db.pool(), places.id).await.unwrap().words_count, 0);
    assert!(words_count_mismatches(db.pool()).await.unwrap().is_empty());
}

fn flashcards() -> NewStudyActivity {
    NewStudyActivity {
        name: "Flashcards".to_string(),
        description: String::new(),
        activity_type: ActivityType::Flashcards,
        thumbnail_url: String::new(),
        launch_url: String::new(),
    }
}

#[tokio::test]
async fn test_group_with_sessions_cannot_be_deleted() {
    let (_dir, db) = setup().await;
    let school = create_group(&db, &group("School")).await.unwrap();
    let activity = create_activity(&db, &flashcards()).await.unwrap();
    launch_session(&db, activity.id, school.id).await.unwrap();

    let err = delete_group(&db, school.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    let err = delete_activity(&db, activity.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Both still readable
    get_group(db.pool(), school.id).await.unwrap();
    get_activity(db.pool(), activity.id).await.unwrap();
}

#[tokio::test]
async fn test_group_without_sessions_soft_deletes() {
    let (_dir, db) = setup().await;
    let school = create_group(&db, &group("School")).await.unwrap();
    let hakgyo = create_word(&db, &word("학교", "hakgyo", "school")).await.unwrap();
    add_word_to_group(&db, school.id, hakgyo.id).await.unwrap();

    delete_group(&db, school.id).await.unwrap();
    assert_eq!(get_group(db.pool(), school.id).await.unwrap_err().kind(), ErrorKind::NotFound);

    // The word survives; the name is free again
    get_word(db.pool(), hakgyo.id).await.unwrap();
    create_group(&db, &group("School")).await.unwrap();
}

#[tokio::test]
async fn test_duplicate_activity_name_conflicts() {
    let (_dir, db) = setup().await;
    create_activity(&db, &flashcards()).await.unwrap();
    let err = create_activity(&db, &flashcards()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn test_update_activity_rename_and_validation() {
    let (_dir, db) = setup().await;
    let flash = create_activity(&db, &flashcards()).await.unwrap();
    let quiz = create_activity(
        &db,
        &NewStudyActivity {
            name: "Quiz".to_string(),
            activity_type: ActivityType::MultipleChoice,
            ..flashcards()
        },
    )
    .await
    .unwrap();

    let renamed = update_activity(
        &db,
        flash.id,
        &StudyActivityUpdate {
            name: Some("  Word Cards ".to_string()),
            launch_url: Some("/study/cards".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(renamed.name, "Word Cards");
    assert_eq!(renamed.launch_url, "/study/cards");
    assert_eq!(renamed.activity_type, ActivityType::Flashcards);

    let rename_onto_existing = StudyActivityUpdate {
        name: Some("Quiz".to_string()),
        ..Default::default()
    };
    let err = update_activity(&db, flash.id, &rename_onto_existing).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let empty_name = StudyActivityUpdate {
        name: Some("   ".to_string()),
        ..Default::default()
    };
    let err = update_activity(&db, quiz.id, &empty_name).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    // Failed updates leave both rows untouched
    assert_eq!(get_activity(db.pool(), quiz.id).await.unwrap().name, "Quiz");
    assert_eq!(get_activity(db.pool(), flash.id).await.unwrap().name, "Word Cards");
}
