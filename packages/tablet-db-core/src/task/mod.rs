//! Tasks: questionnaire records with standard columns, a name-keyed factory,
//! and the session-aware fetch path.

mod factory;
mod session;

use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};

pub use factory::{TaskFactory, TaskMaker, TaskProxy};
pub use session::{LockState, SessionState};

use crate::database::Database;
use crate::dbconst;
use crate::error::DbError;
use crate::field::Field;
use crate::migration::MigrationReport;
use crate::record::{DatabaseObject, DbRecord};
use crate::types::FieldType;

/// Foreign key to the patient table on every patient-linked task.
pub const PATIENT_FK_FIELDNAME: &str = "patient_id";
pub const FIRSTEXIT_FIELDNAME: &str = "when_firstexit";
pub const FIRSTEXIT_IS_FINISH_FIELDNAME: &str = "firstexit_is_finish";
pub const FIRSTEXIT_IS_ABORT_FIELDNAME: &str = "firstexit_is_abort";
pub const EDITING_TIME_S_FIELDNAME: &str = "editing_time_s";

pub const CLINICIAN_FIELDNAMES: [&str; 6] = [
    "clinician_specialty",
    "clinician_name",
    "clinician_professional_registration",
    "clinician_post",
    "clinician_service",
    "clinician_contact_details",
];

pub const RESPONDENT_FIELDNAMES: [&str; 2] = ["respondent_name", "respondent_relationship"];

/// Builds the [`DatabaseObject`] of a task table with the standard task
/// columns already declared.
///
/// ```
/// use tablet_db_core::task::TaskBase;
///
/// let object = TaskBase::new("cecaq3").clinician().respondent().build();
/// assert!(object.has_field("patient_id"));
/// assert!(object.has_field("respondent_name"));
/// ```
#[derive(Debug, Clone)]
pub struct TaskBase {
    tablename: String,
    anonymous: bool,
    clinician: bool,
    respondent: bool,
}

impl TaskBase {
    pub fn new(tablename: impl Into<String>) -> Self {
        Self {
            tablename: tablename.into(),
            anonymous: false,
            clinician: false,
            respondent: false,
        }
    }

    /// Omits the patient foreign key.
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    #[must_use]
    pub fn clinician(mut self) -> Self {
        self.clinician = true;
        self
    }

    #[must_use]
    pub fn respondent(mut self) -> Self {
        self.respondent = true;
        self
    }

    pub fn build(self) -> DatabaseObject {
        let mut object = DatabaseObject::new(self.tablename);
        if !self.anonymous {
            object.add_field(Field::new(PATIENT_FK_FIELDNAME, FieldType::Integer).mandatory());
        }
        object
            .add_field(Field::new(FIRSTEXIT_FIELDNAME, FieldType::DateTime))
            .add_field(Field::new(FIRSTEXIT_IS_FINISH_FIELDNAME, FieldType::Boolean))
            .add_field(Field::new(FIRSTEXIT_IS_ABORT_FIELDNAME, FieldType::Boolean))
            .add_field(
                Field::new(EDITING_TIME_S_FIELDNAME, FieldType::Real).with_default(0.0),
            );
        if self.clinician {
            for name in CLINICIAN_FIELDNAMES {
                object.add_field(Field::new(name, FieldType::Text));
            }
        }
        if self.respondent {
            for name in RESPONDENT_FIELDNAMES {
                object.add_field(Field::new(name, FieldType::Text));
            }
        }
        object
    }
}

/// A questionnaire or other clinical instrument stored in its own table.
///
/// Implementors declare their schema in their constructor (usually starting
/// from [`TaskBase`]) and expose it through [`DbRecord`].
pub trait Task: DbRecord {
    /// Short display name, e.g. `PHQ-9`.
    fn shortname(&self) -> &str;

    fn longname(&self) -> &str;

    /// Whether every required answer is present.
    fn is_complete(&self) -> bool;

    /// Anonymous tasks have no patient and are visible in every session.
    fn is_anonymous(&self) -> bool {
        false
    }

    fn has_clinician(&self) -> bool {
        false
    }

    fn has_respondent(&self) -> bool {
        false
    }

    /// Creates or migrates the tables of this task's ancillary records.
    fn make_ancillary_tables(&self, _db: &Database) -> Result<Vec<MigrationReport>, DbError> {
        Ok(Vec::new())
    }

    /// Reloads every ancillary collection from storage.
    fn load_all_ancillary(&mut self, _db: &Database) {}

    /// Deletes every ancillary row owned by this task.
    fn remove_all_ancillary(&mut self, _db: &Database) -> Result<(), DbError> {
        Ok(())
    }

    fn tablename(&self) -> &str {
        self.object().tablename()
    }

    /// Creates or migrates the main table and all ancillary tables.
    fn make_tables(&self, db: &Database) -> Result<Vec<MigrationReport>, DbError> {
        let mut reports = vec![self.object().make_table(db)?];
        reports.extend(self.make_ancillary_tables(db)?);
        Ok(reports)
    }

    /// Loads the task row and, on a hit, its ancillary records.
    fn load(&mut self, db: &Database, pk: i64) -> Result<bool, DbError> {
        let found = self.object_mut().load(db, pk)?;
        if found {
            self.load_all_ancillary(db);
        }
        Ok(found)
    }

    fn save(&mut self, db: &Database) -> Result<(), DbError> {
        self.object_mut().save(db)
    }

    /// Deletes ancillary rows, then the task row, in one transaction.
    ///
    /// On failure the ancillary collections are reloaded so they match the
    /// rolled-back storage.
    fn remove(&mut self, db: &Database) -> Result<(), DbError> {
        let result = db.transaction(|db| {
            self.remove_all_ancillary(db)?;
            self.object_mut().remove(db)
        });
        if result.is_err() {
            self.load_all_ancillary(db);
        }
        result
    }

    fn patient_id(&self) -> Option<i64> {
        if self.is_anonymous() {
            return None;
        }
        self.object().value_int(PATIENT_FK_FIELDNAME)
    }

    fn when_created(&self) -> Option<DateTime<FixedOffset>> {
        self.object()
            .value_datetime(dbconst::CREATION_TIMESTAMP_FIELDNAME)
    }
}

/// Task list ordering: newest first (undated last), then short name, then
/// primary key.
pub fn task_order(a: &dyn Task, b: &dyn Task) -> Ordering {
    let by_created = match (a.when_created(), b.when_created()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_created
        .then_with(|| a.shortname().cmp(b.shortname()))
        .then_with(|| a.object().pk_value().cmp(&b.object().pk_value()))
}
