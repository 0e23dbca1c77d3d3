//! Concrete task types.

pub mod diagnosis_icd10;
pub mod patient_satisfaction;
pub mod phq9;

use tablet_db_core::task::TaskFactory;

pub use diagnosis_icd10::{DiagnosisIcd10, DiagnosisIcd10Item};
pub use patient_satisfaction::PatientSatisfaction;
pub use phq9::Phq9;

/// Registers every task type in this crate and finishes registration.
pub fn register_all_tasks(factory: &mut TaskFactory) {
    factory.register(Phq9::make);
    factory.register(PatientSatisfaction::make);
    factory.register(DiagnosisIcd10::make);
    factory.finish_registration();
}
