//! ICD-10 diagnosis task, owning an ordered list of diagnosis items.

use tablet_db_core::ancillary::load_ancillary;
use tablet_db_core::migration::MigrationReport;
use tablet_db_core::task::{Task, TaskBase};
use tablet_db_core::{Database, DatabaseObject, DbError, DbRecord, Field, FieldType, OrderBy};

pub const DIAGNOSIS_ICD10_TABLENAME: &str = "diagnosis_icd10";
pub const DIAGNOSIS_ICD10_ITEM_TABLENAME: &str = "diagnosis_icd10_item";
/// Item column referencing `diagnosis_icd10.id`.
pub const FK_NAME: &str = "diagnosis_icd10_id";

const SEQNUM: &str = "seqnum";
const CODE: &str = "code";
const DESCRIPTION: &str = "description";
const COMMENT: &str = "comment";
const RELATES_TO_DATE: &str = "relates_to_date";

/// One coded diagnosis.
pub struct DiagnosisIcd10Item {
    object: DatabaseObject,
}

impl Default for DiagnosisIcd10Item {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisIcd10Item {
    pub fn new() -> Self {
        let mut object = DatabaseObject::new(DIAGNOSIS_ICD10_ITEM_TABLENAME);
        object
            .add_field(Field::new(FK_NAME, FieldType::Integer).mandatory())
            .add_field(Field::new(SEQNUM, FieldType::Integer).mandatory())
            .add_field(Field::new(CODE, FieldType::Text))
            .add_field(Field::new(DESCRIPTION, FieldType::Text))
            .add_field(Field::new(COMMENT, FieldType::Text));
        Self { object }
    }

    pub fn seqnum(&self) -> Option<i64> {
        self.object.value_int(SEQNUM)
    }

    pub fn code(&self) -> Option<&str> {
        self.object.value_string(CODE)
    }

    pub fn description(&self) -> Option<&str> {
        self.object.value_string(DESCRIPTION)
    }

    pub fn comment(&self) -> Option<&str> {
        self.object.value_string(COMMENT)
    }
}

impl DbRecord for DiagnosisIcd10Item {
    fn object(&self) -> &DatabaseObject {
        &self.object
    }

    fn object_mut(&mut self) -> &mut DatabaseObject {
        &mut self.object
    }
}

pub struct DiagnosisIcd10 {
    object: DatabaseObject,
    items: Vec<DiagnosisIcd10Item>,
}

impl Default for DiagnosisIcd10 {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosisIcd10 {
    pub fn new() -> Self {
        let mut object = TaskBase::new(DIAGNOSIS_ICD10_TABLENAME).clinician().build();
        object.add_field(Field::new(RELATES_TO_DATE, FieldType::Date));
        Self {
            object,
            items: Vec::new(),
        }
    }

    pub fn make() -> Box<dyn Task> {
        Box::new(Self::new())
    }

    pub fn items(&self) -> &[DiagnosisIcd10Item] {
        &self.items
    }

    /// Appends a diagnosis, saving this task first if it has no row yet.
    pub fn add_item(
        &mut self,
        db: &Database,
        code: &str,
        description: &str,
    ) -> Result<(), DbError> {
        let pk = self.object.ensure_saved(db)?;
        let seqnum = self.items.last().and_then(|i| i.seqnum()).unwrap_or(0) + 1;
        let mut item = DiagnosisIcd10Item::new();
        item.object.set_value(FK_NAME, pk);
        item.object.set_value(SEQNUM, seqnum);
        item.object.set_value(CODE, code);
        item.object.set_value(DESCRIPTION, description);
        item.object.save(db)?;
        tracing::debug!("{} {}: added item {} ({})", DIAGNOSIS_ICD10_TABLENAME, pk, seqnum, code);
        self.items.push(item);
        Ok(())
    }
}

impl DbRecord for DiagnosisIcd10 {
    fn object(&self) -> &DatabaseObject {
        &self.object
    }

    fn object_mut(&mut self) -> &mut DatabaseObject {
        &mut self.object
    }
}

impl Task for DiagnosisIcd10 {
    fn shortname(&self) -> &str {
        "Diagnosis_ICD10"
    }

    fn longname(&self) -> &str {
        "Diagnostic codes, ICD-10"
    }

    fn is_complete(&self) -> bool {
        !self.items.is_empty()
    }

    fn has_clinician(&self) -> bool {
        true
    }

    fn make_ancillary_tables(&self, db: &Database) -> Result<Vec<MigrationReport>, DbError> {
        Ok(vec![DiagnosisIcd10Item::new().object.make_table(db)?])
    }

    fn load_all_ancillary(&mut self, db: &Database) {
        match self.object.pk_value() {
            Some(pk) => load_ancillary(
                &mut self.items,
                db,
                DiagnosisIcd10Item::new,
                FK_NAME,
                &OrderBy::new().asc(SEQNUM),
                pk,
            ),
            None => self.items.clear(),
        }
    }

    fn remove_all_ancillary(&mut self, db: &Database) -> Result<(), DbError> {
        self.load_all_ancillary(db);
        for item in &mut self.items {
            item.object.remove(db)?;
        }
        self.items.clear();
        Ok(())
    }
}
