//! Name-keyed task catalogue and the session-aware fetch path.

use std::collections::BTreeMap;

use super::{task_order, Task, PATIENT_FK_FIELDNAME};
use crate::database::{Database, OrderBy, WhereConditions};
use crate::dbconst;
use crate::error::DbError;
use crate::migration::MigrationReport;
use crate::task::SessionState;

/// Constructs an unbound instance of one task type.
pub type TaskMaker = fn() -> Box<dyn Task>;

/// Factory for one task type.
#[derive(Clone, Copy)]
pub struct TaskProxy {
    make: TaskMaker,
}

impl std::fmt::Debug for TaskProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskProxy")
            .field("tablename", &self.specimen().tablename())
            .finish()
    }
}

impl TaskProxy {
    pub fn new(make: TaskMaker) -> Self {
        Self { make }
    }

    /// An unbound instance, for schema and name inspection.
    pub fn specimen(&self) -> Box<dyn Task> {
        (self.make)()
    }

    /// Constructs an instance and, unless `pk` is `None` or the nonexistent
    /// sentinel, loads it. A load miss still returns the (unbound) instance.
    pub fn create(&self, db: &Database, pk: Option<i64>) -> Result<Box<dyn Task>, DbError> {
        let mut task = self.specimen();
        if let Some(pk) = pk.filter(|pk| *pk != dbconst::NONEXISTENT_PK) {
            if !task.load(db, pk)? {
                tracing::warn!("{} {} not found", task.tablename(), pk);
            }
        }
        Ok(task)
    }

    /// Every stored instance, in primary-key order, with ancillaries loaded.
    ///
    /// With `patient_id` set, only that patient's instances are returned;
    /// the filter is ignored for anonymous tasks.
    pub fn fetch(
        &self,
        db: &Database,
        patient_id: Option<i64>,
    ) -> Result<Vec<Box<dyn Task>>, DbError> {
        let specimen = self.specimen();
        let mut where_ = WhereConditions::new();
        if let Some(patient_id) = patient_id.filter(|_| !specimen.is_anonymous()) {
            where_.add(PATIENT_FK_FIELDNAME, patient_id);
        }
        let order_by = OrderBy::new().asc(specimen.object().pk_fieldname());
        let rows = db.query(&specimen.object().fetch_query_sql(&where_, &order_by))?;

        let mut tasks = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut task = self.specimen();
            task.object_mut().set_from_row(row);
            task.load_all_ancillary(db);
            tasks.push(task);
        }
        Ok(tasks)
    }
}

#[derive(Debug)]
struct TaskEntry {
    shortname: String,
    longname: String,
    anonymous: bool,
    proxy: TaskProxy,
}

/// Registry of every task type, keyed by table name.
///
/// Types are registered into a pending list, then indexed by
/// [`finish_registration`](Self::finish_registration) once all are known.
#[derive(Debug, Default)]
pub struct TaskFactory {
    pending: Vec<TaskProxy>,
    entries: BTreeMap<String, TaskEntry>,
}

impl TaskFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a task type. Nothing is instantiated until
    /// [`finish_registration`](Self::finish_registration).
    pub fn register(&mut self, make: TaskMaker) {
        self.pending.push(TaskProxy::new(make));
    }

    /// Indexes every pending task type by its table name.
    ///
    /// # Panics
    ///
    /// Panics if two task types use the same table name.
    pub fn finish_registration(&mut self) {
        for proxy in std::mem::take(&mut self.pending) {
            let specimen = proxy.specimen();
            let tablename = specimen.tablename().to_string();
            if self.entries.contains_key(&tablename) {
                panic!(
                    "BAD TASK REGISTRATION: table '{}' registered twice",
                    tablename
                );
            }
            tracing::debug!("Registered task {} ({})", specimen.shortname(), tablename);
            self.entries.insert(
                tablename,
                TaskEntry {
                    shortname: specimen.shortname().to_string(),
                    longname: specimen.longname().to_string(),
                    anonymous: specimen.is_anonymous(),
                    proxy,
                },
            );
        }
    }

    /// Registered table names, sorted.
    pub fn tablenames(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, tablename: &str) -> bool {
        self.entries.contains_key(tablename)
    }

    pub fn shortname(&self, tablename: &str) -> Option<&str> {
        self.entries.get(tablename).map(|e| e.shortname.as_str())
    }

    pub fn longname(&self, tablename: &str) -> Option<&str> {
        self.entries.get(tablename).map(|e| e.longname.as_str())
    }

    pub fn proxy(&self, tablename: &str) -> Option<&TaskProxy> {
        self.entries.get(tablename).map(|e| &e.proxy)
    }

    /// Constructs a task, loading `pk` if given.
    ///
    /// # Returns
    /// `Ok(None)` if `tablename` is not registered.
    pub fn create(
        &self,
        db: &Database,
        tablename: &str,
        pk: Option<i64>,
    ) -> Result<Option<Box<dyn Task>>, DbError> {
        match self.entries.get(tablename) {
            Some(entry) => entry.proxy.create(db, pk).map(Some),
            None => {
                tracing::warn!("No task registered for table '{}'", tablename);
                Ok(None)
            }
        }
    }

    /// Creates or migrates one task type's tables.
    pub fn make_tables(
        &self,
        db: &Database,
        tablename: &str,
    ) -> Result<Vec<MigrationReport>, DbError> {
        match self.entries.get(tablename) {
            Some(entry) => entry.proxy.specimen().make_tables(db),
            None => {
                tracing::warn!("No task registered for table '{}'", tablename);
                Ok(Vec::new())
            }
        }
    }

    /// Creates or migrates every registered task type's tables.
    pub fn make_all_tables(&self, db: &Database) -> Result<Vec<MigrationReport>, DbError> {
        let mut reports = Vec::new();
        for entry in self.entries.values() {
            reports.extend(entry.proxy.specimen().make_tables(db)?);
        }
        Ok(reports)
    }

    /// Tasks visible in `session`.
    ///
    /// # Arguments
    /// * `tablename` - Task table, or `""` for every task of the selected patient
    /// * `sort` - Apply [`task_order`] (stable)
    ///
    /// Patient-linked tasks are never returned while the session is locked
    /// with no patient selected.
    pub fn fetch(
        &self,
        db: &Database,
        session: &SessionState,
        tablename: &str,
        sort: bool,
    ) -> Result<Vec<Box<dyn Task>>, DbError> {
        let mut tasks = if tablename.is_empty() {
            match session.selected_patient_id {
                Some(patient_id) => {
                    let mut all = Vec::new();
                    for entry in self.entries.values() {
                        all.extend(entry.proxy.fetch(db, Some(patient_id))?);
                    }
                    all
                }
                None => Vec::new(),
            }
        } else {
            match self.entries.get(tablename) {
                None => {
                    tracing::warn!("Fetch of unregistered task table '{}'", tablename);
                    Vec::new()
                }
                Some(entry) if entry.anonymous => entry.proxy.fetch(db, None)?,
                Some(entry) => match session.selected_patient_id {
                    Some(patient_id) => entry.proxy.fetch(db, Some(patient_id))?,
                    None if !session.is_locked() => entry.proxy.fetch(db, None)?,
                    None => Vec::new(),
                },
            }
        };
        if sort {
            tasks.sort_by(|a, b| task_order(a.as_ref(), b.as_ref()));
        }
        Ok(tasks)
    }
}
