//! Anonymous patient satisfaction survey.

use tablet_db_core::task::{Task, TaskBase};
use tablet_db_core::{DatabaseObject, DbRecord, Field, FieldType};

pub const PT_SATIS_TABLENAME: &str = "pt_satis";

pub struct PatientSatisfaction {
    object: DatabaseObject,
}

impl Default for PatientSatisfaction {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientSatisfaction {
    pub fn new() -> Self {
        let mut object = TaskBase::new(PT_SATIS_TABLENAME).anonymous().build();
        object
            .add_field(Field::new("service", FieldType::Text))
            .add_field(Field::new("rating", FieldType::Integer))
            .add_field(Field::new("good", FieldType::Text))
            .add_field(Field::new("bad", FieldType::Text));
        Self { object }
    }

    pub fn make() -> Box<dyn Task> {
        Box::new(Self::new())
    }
}

impl DbRecord for PatientSatisfaction {
    fn object(&self) -> &DatabaseObject {
        &self.object
    }

    fn object_mut(&mut self) -> &mut DatabaseObject {
        &mut self.object
    }
}

impl Task for PatientSatisfaction {
    fn shortname(&self) -> &str {
        "PatientSatisfaction"
    }

    fn longname(&self) -> &str {
        "Patient Satisfaction Scale"
    }

    fn is_complete(&self) -> bool {
        self.object.no_values_null(&["rating"])
    }

    fn is_anonymous(&self) -> bool {
        true
    }
}
