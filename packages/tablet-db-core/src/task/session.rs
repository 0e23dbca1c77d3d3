use serde::{Deserialize, Serialize};

/// Application lock state. Only `Locked` restricts task visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockState {
    #[default]
    Locked,
    Unlocked,
    Privileged,
}

/// The context a task fetch runs under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub selected_patient_id: Option<i64>,
    pub lock_state: LockState,
}

impl SessionState {
    pub fn new(selected_patient_id: Option<i64>, lock_state: LockState) -> Self {
        Self {
            selected_patient_id,
            lock_state,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.lock_state == LockState::Locked
    }

    pub fn is_patient_selected(&self) -> bool {
        self.selected_patient_id.is_some()
    }
}
