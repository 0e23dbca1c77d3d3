//! Task factory: registration, creation, and the session-aware fetch rules.

use ntest::timeout;

use tablet_db_core::task::{LockState, SessionState, Task, TaskFactory};
use tablet_db_core::{dbconst, Database, DbRecord};

use super::helpers::{factory, memory_db, save_mood, save_survey, Mood, Survey};

fn seeded() -> (Database, TaskFactory) {
    let db = memory_db();
    let factory = factory();
    factory.make_all_tables(&db).unwrap();
    save_mood(&db, 1, 0);
    save_mood(&db, 1, 1);
    save_mood(&db, 2, 2);
    save_survey(&db, 5);
    (db, factory)
}

fn fetch_count(db: &Database, factory: &TaskFactory, session: SessionState, table: &str) -> usize {
    factory.fetch(db, &session, table, false).unwrap().len()
}

#[timeout(5000)]
#[test]
fn test_registration_catalogue() {
    let factory = factory();
    assert_eq!(factory.tablenames(), vec![Mood::TABLENAME, Survey::TABLENAME]);
    assert_eq!(factory.shortname(Mood::TABLENAME), Some("Mood"));
    assert_eq!(factory.longname(Survey::TABLENAME), Some("Anonymous survey"));
    assert_eq!(factory.shortname("nope"), None);
}

#[test]
#[should_panic(expected = "registered twice")]
fn test_duplicate_table_is_fatal() {
    let mut factory = TaskFactory::new();
    factory.register(Mood::make);
    factory.register(Mood::make);
    factory.finish_registration();
}

#[timeout(5000)]
#[test]
fn test_make_all_tables() {
    let db = memory_db();
    let reports = factory().make_all_tables(&db).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.created));
    assert!(db.table_exists(Mood::TABLENAME).unwrap());
    assert!(db.table_exists(Survey::TABLENAME).unwrap());
}

#[timeout(5000)]
#[test]
fn test_create() {
    let (db, factory) = seeded();
    let task = factory.create(&db, Mood::TABLENAME, Some(2)).unwrap().unwrap();
    assert_eq!(task.object().value_int("q1"), Some(1));
    assert_eq!(task.patient_id(), Some(1));

    let blank = factory.create(&db, Survey::TABLENAME, None).unwrap().unwrap();
    assert!(blank.object().is_new());
    let sentinel = factory
        .create(&db, Survey::TABLENAME, Some(dbconst::NONEXISTENT_PK))
        .unwrap()
        .unwrap();
    assert!(sentinel.object().is_new());
    let missing = factory.create(&db, Survey::TABLENAME, Some(99)).unwrap().unwrap();
    assert!(missing.object().is_new());

    assert!(factory.create(&db, "nope", None).unwrap().is_none());
}

#[timeout(5000)]
#[test]
fn test_fetch_all_tasks_requires_patient() {
    let (db, factory) = seeded();
    let unlocked = SessionState::new(None, LockState::Unlocked);
    assert_eq!(fetch_count(&db, &factory, unlocked, ""), 0);

    let patient1 = SessionState::new(Some(1), LockState::Locked);
    // Two of patient 1's mood tasks plus the anonymous survey.
    assert_eq!(fetch_count(&db, &factory, patient1, ""), 3);
}

#[timeout(5000)]
#[test]
fn test_fetch_unknown_table_is_empty() {
    let (db, factory) = seeded();
    let session = SessionState::new(Some(1), LockState::Privileged);
    assert_eq!(fetch_count(&db, &factory, session, "nope"), 0);
}

#[timeout(5000)]
#[test]
fn test_fetch_anonymous_ignores_context() {
    let (db, factory) = seeded();
    for session in [
        SessionState::new(None, LockState::Locked),
        SessionState::new(Some(2), LockState::Unlocked),
    ] {
        assert_eq!(fetch_count(&db, &factory, session, Survey::TABLENAME), 1);
    }
}

#[timeout(5000)]
#[test]
fn test_fetch_patient_linked_rules() {
    let (db, factory) = seeded();
    let cases = [
        (SessionState::new(Some(1), LockState::Locked), 2),
        (SessionState::new(Some(2), LockState::Unlocked), 1),
        (SessionState::new(Some(9), LockState::Privileged), 0),
        (SessionState::new(None, LockState::Unlocked), 3),
        (SessionState::new(None, LockState::Privileged), 3),
        (SessionState::new(None, LockState::Locked), 0),
    ];
    for (session, expected) in cases {
        assert_eq!(
            fetch_count(&db, &factory, session, Mood::TABLENAME),
            expected,
            "{:?}",
            session
        );
    }
}

#[timeout(5000)]
#[test]
fn test_locked_without_patient_never_returns_patient_tasks() {
    let (db, factory) = seeded();
    let session = SessionState::default();
    for table in factory.tablenames() {
        let tasks = factory.fetch(&db, &session, table, true).unwrap();
        assert!(tasks.iter().all(|t| t.is_anonymous()));
    }
}

#[timeout(5000)]
#[test]
fn test_fetch_sorted_newest_first() {
    let (db, factory) = seeded();
    db.connection()
        .execute(
            "UPDATE mood SET when_created = '2001-01-01T00:00:00.000Z' WHERE id = 2",
            [],
        )
        .unwrap();
    let session = SessionState::new(Some(1), LockState::Unlocked);
    let tasks = factory.fetch(&db, &session, "", true).unwrap();
    let last = tasks.last().unwrap();
    assert_eq!(last.tablename(), Mood::TABLENAME);
    assert_eq!(last.object().pk_value(), Some(2));
    for pair in tasks.windows(2) {
        assert!(pair[0].when_created() >= pair[1].when_created());
    }
}
