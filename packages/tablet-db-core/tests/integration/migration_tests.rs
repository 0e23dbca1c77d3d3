//! Additive migration of a store written by an older schema.

use ntest::timeout;
use tempfile::tempdir;

use tablet_db_core::migration::make_table;
use tablet_db_core::{Database, DatabaseObject, Field, FieldType};

use super::helpers::file_config;

fn old_schema() -> DatabaseObject {
    let mut object = DatabaseObject::new("questionnaire");
    object.add_field(Field::new("q1", FieldType::Integer));
    object
}

fn new_schema() -> DatabaseObject {
    let mut object = old_schema();
    object
        .add_field(Field::new("q2", FieldType::Integer))
        .add_field(Field::new("note", FieldType::Text).unique());
    object
}

#[timeout(5000)]
#[test]
fn test_additive_migration_keeps_rows() {
    let dir = tempdir().unwrap();
    let config = file_config(&dir);

    {
        let db = Database::open(&config).unwrap();
        make_table(&db, &old_schema()).unwrap();
        for q1 in [4, 7] {
            let mut row = old_schema();
            row.set_value("q1", q1);
            row.save(&db).unwrap();
        }
    }

    let db = Database::open(&config).unwrap();
    let report = make_table(&db, &new_schema()).unwrap();
    assert!(!report.created);
    assert_eq!(report.added_columns, vec!["q2".to_string(), "note".to_string()]);
    assert!(report.unexpected_columns.is_empty());

    for (pk, q1) in [(1, 4), (2, 7)] {
        let mut row = new_schema();
        assert!(row.load(&db, pk).unwrap());
        assert_eq!(row.value_int("q1"), Some(q1));
        assert!(row.value_is_null("q2"));
        assert!(row.value_is_null("note"));
    }

    let mut row = new_schema();
    row.load(&db, 1).unwrap();
    row.set_value("q2", 9);
    row.save(&db).unwrap();
    let mut again = new_schema();
    again.load(&db, 1).unwrap();
    assert_eq!(again.value_int("q2"), Some(9));
}

#[timeout(5000)]
#[test]
fn test_migration_is_idempotent() {
    let dir = tempdir().unwrap();
    let db = Database::open(&file_config(&dir)).unwrap();
    assert!(make_table(&db, &new_schema()).unwrap().created);
    assert!(make_table(&db, &new_schema()).unwrap().is_unchanged());
}

#[test]
fn test_migration_report_serializes() -> anyhow::Result<()> {
    let dir = tempdir()?;
    let db = Database::open(&file_config(&dir))?;
    let report = make_table(&db, &new_schema())?;
    let json = serde_json::to_value(&report)?;
    assert_eq!(json["table"], "questionnaire");
    assert_eq!(json["created"], true);
    Ok(())
}
