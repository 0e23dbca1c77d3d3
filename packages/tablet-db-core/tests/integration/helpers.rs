//! Shared fixtures: stores and two small task types.

use tablet_db_core::config::DbConfig;
use tablet_db_core::task::{Task, TaskBase, TaskFactory};
use tablet_db_core::{Database, DatabaseObject, DbRecord, Field, FieldType};
use tempfile::TempDir;

pub fn memory_db() -> Database {
    let config = DbConfig {
        record_statements: true,
        ..DbConfig::default()
    };
    Database::open_in_memory(&config).unwrap()
}

pub fn file_config(dir: &TempDir) -> DbConfig {
    DbConfig {
        database_path: dir.path().join("nested").join("tablet.sqlite"),
        ..DbConfig::default()
    }
}

/// Patient-linked task with three mandatory answers.
pub struct Mood {
    object: DatabaseObject,
}

impl Mood {
    pub const TABLENAME: &'static str = "mood";

    pub fn new() -> Self {
        let mut object = TaskBase::new(Self::TABLENAME).clinician().build();
        object
            .add_field(Field::new("q1", FieldType::Integer).mandatory())
            .add_field(Field::new("q2", FieldType::Integer).mandatory())
            .add_field(Field::new("comment", FieldType::Text).mandatory());
        Self { object }
    }

    pub fn make() -> Box<dyn Task> {
        Box::new(Self::new())
    }
}

impl DbRecord for Mood {
    fn object(&self) -> &DatabaseObject {
        &self.object
    }

    fn object_mut(&mut self) -> &mut DatabaseObject {
        &mut self.object
    }
}

impl Task for Mood {
    fn shortname(&self) -> &str {
        "Mood"
    }

    fn longname(&self) -> &str {
        "Mood rating"
    }

    fn is_complete(&self) -> bool {
        self.object.no_values_null(&["q1", "q2", "comment"])
    }

    fn has_clinician(&self) -> bool {
        true
    }
}

/// Anonymous single-item survey.
pub struct Survey {
    object: DatabaseObject,
}

impl Survey {
    pub const TABLENAME: &'static str = "survey";

    pub fn new() -> Self {
        let mut object = TaskBase::new(Self::TABLENAME).anonymous().build();
        object.add_field(Field::new("rating", FieldType::Integer));
        Self { object }
    }

    pub fn make() -> Box<dyn Task> {
        Box::new(Self::new())
    }
}

impl DbRecord for Survey {
    fn object(&self) -> &DatabaseObject {
        &self.object
    }

    fn object_mut(&mut self) -> &mut DatabaseObject {
        &mut self.object
    }
}

impl Task for Survey {
    fn shortname(&self) -> &str {
        "Survey"
    }

    fn longname(&self) -> &str {
        "Anonymous survey"
    }

    fn is_complete(&self) -> bool {
        !self.object.value_is_null("rating")
    }

    fn is_anonymous(&self) -> bool {
        true
    }
}

pub fn factory() -> TaskFactory {
    let mut factory = TaskFactory::new();
    factory.register(Mood::make);
    factory.register(Survey::make);
    factory.finish_registration();
    factory
}

pub fn save_mood(db: &Database, patient_id: i64, q1: i64) -> i64 {
    let mut task = Mood::new();
    task.object_mut().set_value("patient_id", patient_id);
    task.object_mut().set_value("q1", q1);
    task.object_mut().set_value("q2", 0);
    task.object_mut().set_value("comment", "ok");
    task.save(db).unwrap();
    task.object().pk_value().unwrap()
}

pub fn save_survey(db: &Database, rating: i64) -> i64 {
    let mut task = Survey::new();
    task.object_mut().set_value("rating", rating);
    task.save(db).unwrap();
    task.object().pk_value().unwrap()
}
