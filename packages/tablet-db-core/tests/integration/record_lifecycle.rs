//! Record lifecycle against a real store.

use ntest::timeout;
use tempfile::tempdir;

use tablet_db_core::dbconst;
use tablet_db_core::task::Task;
use tablet_db_core::{Database, DbRecord, Value, WhereConditions};

use super::helpers::{file_config, memory_db, save_mood, Mood};

/// Create, then reload in a fresh instance from a reopened file.
#[timeout(5000)]
#[test]
fn test_create_and_reload_across_reopen() {
    let dir = tempdir().unwrap();
    let config = file_config(&dir);

    let pk = {
        let db = Database::open(&config).unwrap();
        Mood::new().make_tables(&db).unwrap();
        let mut task = Mood::new();
        task.object_mut().set_value("patient_id", 3);
        task.object_mut().set_value("q1", 1);
        task.object_mut().set_value("q2", 2);
        task.object_mut().set_value("comment", "fine");
        task.save(&db).unwrap();
        assert_eq!(task.object().pk_value(), Some(1));
        1
    };

    let db = Database::open(&config).unwrap();
    let mut task = Mood::new();
    assert!(task.load(&db, pk).unwrap());
    assert_eq!(task.object().value_int("q1"), Some(1));
    assert_eq!(task.object().value_int("q2"), Some(2));
    assert_eq!(task.object().value_string("comment"), Some("fine"));
    assert!(!task.object().is_dirty());
    assert!(task.is_complete());
}

/// Unchanged assignment is not written; the modification time advances.
#[timeout(5000)]
#[test]
fn test_partial_update_advances_modification_time() {
    let db = memory_db();
    Mood::new().make_tables(&db).unwrap();
    let pk = save_mood(&db, 1, 1);
    db.connection()
        .execute(
            "UPDATE mood SET when_last_modified = '2000-01-01T00:00:00.000Z', q2 = 2",
            [],
        )
        .unwrap();

    let mut task = Mood::new();
    task.load(&db, pk).unwrap();
    let before = task
        .object()
        .value_datetime(dbconst::MODIFICATION_TIMESTAMP_FIELDNAME)
        .unwrap();
    db.take_recorded_statements();

    assert!(!task.object_mut().set_value("q1", 1));
    assert!(task.object_mut().set_value("q2", 5));
    task.save(&db).unwrap();

    let updates: Vec<_> = db
        .take_recorded_statements()
        .into_iter()
        .filter(|s| s.sql.starts_with("UPDATE"))
        .collect();
    assert_eq!(updates.len(), 1);
    assert!(updates[0].sql.contains("\"q2\" = ?"));
    assert!(!updates[0].sql.contains("\"q1\" = ?"));

    let mut reloaded = Mood::new();
    reloaded.load(&db, pk).unwrap();
    let after = reloaded
        .object()
        .value_datetime(dbconst::MODIFICATION_TIMESTAMP_FIELDNAME)
        .unwrap();
    assert!(after > before);
    assert_eq!(reloaded.object().value("q2"), &Value::Int(5));
}

/// Primary key survives every save.
#[timeout(5000)]
#[test]
fn test_pk_stable_across_saves() {
    let db = memory_db();
    Mood::new().make_tables(&db).unwrap();
    let pk = save_mood(&db, 1, 1);
    let mut task = Mood::new();
    task.load(&db, pk).unwrap();
    for i in 0..3 {
        task.object_mut().set_value("q1", i);
        task.save(&db).unwrap();
        assert_eq!(task.object().pk_value(), Some(pk));
    }
    assert_eq!(db.count(Mood::TABLENAME, &WhereConditions::new()).unwrap(), 1);
}

/// Deleting leaves no row and an unbound instance.
#[timeout(5000)]
#[test]
fn test_remove() {
    let db = memory_db();
    Mood::new().make_tables(&db).unwrap();
    let pk = save_mood(&db, 1, 1);
    save_mood(&db, 1, 2);

    let mut task = Mood::new();
    task.load(&db, pk).unwrap();
    task.remove(&db).unwrap();
    assert!(task.object().is_new());
    assert_eq!(db.count(Mood::TABLENAME, &WhereConditions::new()).unwrap(), 1);
    assert!(!Mood::new().load(&db, pk).unwrap());
}
