//! PHQ-9 depression questionnaire.

use tablet_db_core::task::{Task, TaskBase};
use tablet_db_core::{DatabaseObject, DbRecord, Field, FieldType};

pub const PHQ9_TABLENAME: &str = "phq9";
const N_SCORED_QUESTIONS: usize = 9;
/// Functional impairment question; only asked once any symptom scores.
const IMPAIRMENT_FIELDNAME: &str = "q10";

fn question_fieldnames() -> Vec<String> {
    (1..=N_SCORED_QUESTIONS).map(|i| format!("q{}", i)).collect()
}

pub struct Phq9 {
    object: DatabaseObject,
}

impl Default for Phq9 {
    fn default() -> Self {
        Self::new()
    }
}

impl Phq9 {
    pub fn new() -> Self {
        let mut object = TaskBase::new(PHQ9_TABLENAME).build();
        for name in question_fieldnames() {
            object.add_field(Field::new(name, FieldType::Integer));
        }
        object.add_field(Field::new(IMPAIRMENT_FIELDNAME, FieldType::Integer));
        Self { object }
    }

    pub fn make() -> Box<dyn Task> {
        Box::new(Self::new())
    }

    fn any_symptom_scored(&self) -> bool {
        question_fieldnames()
            .iter()
            .any(|q| self.object.value_int(q).unwrap_or(0) > 0)
    }
}

impl DbRecord for Phq9 {
    fn object(&self) -> &DatabaseObject {
        &self.object
    }

    fn object_mut(&mut self) -> &mut DatabaseObject {
        &mut self.object
    }
}

impl Task for Phq9 {
    fn shortname(&self) -> &str {
        "PHQ-9"
    }

    fn longname(&self) -> &str {
        "Patient Health Questionnaire-9"
    }

    fn is_complete(&self) -> bool {
        let names = question_fieldnames();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        self.object.no_values_null(&names)
            && (!self.any_symptom_scored() || !self.object.value_is_null(IMPAIRMENT_FIELDNAME))
    }
}
