//! Generic database object.
//!
//! A `DatabaseObject` owns the schema of one table and the values of at most
//! one of its rows. States:
//! - unbound: primary key null, not backed by any row (specimens, new records)
//! - loaded: primary key set, every field clean
//! - dirty: primary key set, one or more non-key fields changed
//!
//! `save()` moves unbound and dirty objects to loaded. `remove()` deletes the
//! row and returns the object to unbound.

use chrono::{DateTime, FixedOffset, NaiveDate};
use rusqlite::types::Value as StorageValue;
use uuid::Uuid;

use super::sql;
use crate::database::{Database, OrderBy, Row, SqlArgs, WhereConditions};
use crate::datetime;
use crate::dbconst;
use crate::error::DbError;
use crate::field::Field;
use crate::migration::{self, MigrationReport};
use crate::schema::Schema;
use crate::types::{FieldType, Value};

/// Which structural columns a table carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectOptions {
    /// Name of the integer primary key column
    pub pk_fieldname: String,
    /// Add `when_created`, stamped on first insert
    pub has_creation_timestamp: bool,
    /// Add `when_last_modified`, stamped on every write
    pub has_modification_timestamp: bool,
    /// Add the `_move_off_tablet` sync-exclusion flag
    pub has_move_off_tablet_field: bool,
}

impl Default for ObjectOptions {
    fn default() -> Self {
        Self {
            pk_fieldname: dbconst::PK_FIELDNAME.to_string(),
            has_creation_timestamp: true,
            has_modification_timestamp: true,
            has_move_off_tablet_field: true,
        }
    }
}

/// Schema plus the values of one row of one table.
#[derive(Debug, Clone)]
pub struct DatabaseObject {
    tablename: String,
    options: ObjectOptions,
    schema: Schema,
}

impl DatabaseObject {
    /// Creates an unbound object with the standard structural columns.
    pub fn new(tablename: impl Into<String>) -> Self {
        Self::with_options(tablename, ObjectOptions::default())
    }

    pub fn with_options(tablename: impl Into<String>, options: ObjectOptions) -> Self {
        let tablename = tablename.into();
        let mut schema = Schema::new(tablename.clone());
        schema.add(Field::new(options.pk_fieldname.clone(), FieldType::Integer).primary_key());
        if options.has_modification_timestamp {
            schema.add(Field::new(
                dbconst::MODIFICATION_TIMESTAMP_FIELDNAME,
                FieldType::DateTime,
            ));
        }
        if options.has_creation_timestamp {
            schema.add(Field::new(
                dbconst::CREATION_TIMESTAMP_FIELDNAME,
                FieldType::DateTime,
            ));
        }
        if options.has_move_off_tablet_field {
            schema.add(
                Field::new(dbconst::MOVE_OFF_TABLET_FIELDNAME, FieldType::Boolean)
                    .with_default(false),
            );
        }
        Self {
            tablename,
            options,
            schema,
        }
    }

    /// Declares a field. Must happen before any load or save.
    ///
    /// # Panics
    ///
    /// Panics if the name is already declared, or if `field` is a second
    /// primary key.
    pub fn add_field(&mut self, field: Field) -> &mut Self {
        if field.is_pk() {
            panic!(
                "Table '{}' already has primary key '{}'; cannot add '{}'",
                self.tablename,
                self.options.pk_fieldname,
                field.name()
            );
        }
        self.schema.add(field);
        self
    }

    pub fn tablename(&self) -> &str {
        &self.tablename
    }

    pub fn pk_fieldname(&self) -> &str {
        &self.options.pk_fieldname
    }

    pub fn options(&self) -> &ObjectOptions {
        &self.options
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.schema.contains(name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.schema.names()
    }

    /// # Panics
    ///
    /// Panics if `name` is not declared.
    pub fn field(&self, name: &str) -> &Field {
        self.schema.get(name)
    }

    // ------------------------------------------------------------------------
    // Values
    // ------------------------------------------------------------------------

    /// # Panics
    ///
    /// Panics if `name` is not declared.
    pub fn value(&self, name: &str) -> &Value {
        self.schema.get(name).value()
    }

    pub fn value_int(&self, name: &str) -> Option<i64> {
        match self.value(name) {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn value_real(&self, name: &str) -> Option<f64> {
        match self.value(name) {
            Value::Real(f) => Some(*f),
            _ => None,
        }
    }

    pub fn value_bool(&self, name: &str) -> Option<bool> {
        match self.value(name) {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn value_string(&self, name: &str) -> Option<&str> {
        match self.value(name) {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn value_date(&self, name: &str) -> Option<NaiveDate> {
        match self.value(name) {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn value_datetime(&self, name: &str) -> Option<DateTime<FixedOffset>> {
        match self.value(name) {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn value_uuid(&self, name: &str) -> Option<Uuid> {
        match self.value(name) {
            Value::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    pub fn value_is_null(&self, name: &str) -> bool {
        self.value(name).is_null()
    }

    /// Relational equality: false if either side is null.
    pub fn value_eq(&self, name: &str, other: &Value) -> bool {
        self.value(name).sql_eq(other)
    }

    pub fn any_values_null(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.value_is_null(n))
    }

    pub fn no_values_null(&self, names: &[&str]) -> bool {
        !self.any_values_null(names)
    }

    /// Assigns a field. Returns whether the value changed.
    ///
    /// # Panics
    ///
    /// Panics if `name` is undeclared or is the primary key: identity only
    /// changes by loading or inserting.
    pub fn set_value(&mut self, name: &str, value: impl Into<Value>) -> bool {
        if name == self.options.pk_fieldname {
            panic!(
                "Primary key '{}' of table '{}' cannot be assigned",
                name, self.tablename
            );
        }
        self.schema.get_mut(name).set_value(value)
    }

    /// Sets a field to null. Returns whether the value changed.
    pub fn nullify(&mut self, name: &str) -> bool {
        self.set_value(name, Value::Null)
    }

    // ------------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------------

    /// Primary key, if the object is backed by a row.
    pub fn pk_value(&self) -> Option<i64> {
        self.value_int(&self.options.pk_fieldname)
    }

    /// Whether the next save will INSERT.
    pub fn is_new(&self) -> bool {
        self.pk_value().is_none()
    }

    /// True iff any non-key field is dirty.
    pub fn is_dirty(&self) -> bool {
        self.schema.iter().any(|f| !f.is_pk() && f.is_dirty())
    }

    /// Marks every field for writing on the next save.
    pub fn set_all_dirty(&mut self) {
        for field in self.schema.iter_mut() {
            field.set_dirty();
        }
    }

    // ------------------------------------------------------------------------
    // Load
    // ------------------------------------------------------------------------

    /// Loads the row with the given primary key.
    ///
    /// Returns `Ok(false)` on a miss, leaving an unbound object unbound. A key
    /// of [`dbconst::NONEXISTENT_PK`] misses without querying.
    ///
    /// # Panics
    ///
    /// Panics if the object is already bound to a different primary key.
    pub fn load(&mut self, db: &Database, pk: i64) -> Result<bool, DbError> {
        if pk == dbconst::NONEXISTENT_PK {
            self.mark_unsaved();
            return Ok(false);
        }
        if let Some(current) = self.pk_value() {
            if current != pk {
                panic!(
                    "Object in table '{}' is bound to {}={}; cannot load {}",
                    self.tablename, self.options.pk_fieldname, current, pk
                );
            }
        }
        let pk_fieldname = self.options.pk_fieldname.clone();
        self.load_by(db, &pk_fieldname, pk)
    }

    /// Loads the first row whose `column` equals `value`, typically a unique
    /// column such as a variable name.
    pub fn load_by(
        &mut self,
        db: &Database,
        column: &str,
        value: impl Into<Value>,
    ) -> Result<bool, DbError> {
        let where_ = WhereConditions::new().with(column, value);
        let args = self.fetch_query_sql(&where_, &OrderBy::new());
        let rows = db.query(&args)?;
        match rows.first() {
            Some(row) => {
                self.set_from_row(row);
                tracing::debug!(
                    "Loaded {} {}={:?}",
                    self.tablename,
                    self.options.pk_fieldname,
                    self.pk_value()
                );
                Ok(true)
            }
            None => {
                tracing::debug!("No row in {} where {} matches", self.tablename, column);
                self.mark_unsaved();
                Ok(false)
            }
        }
    }

    /// SELECT of every declared column.
    pub fn fetch_query_sql(&self, where_: &WhereConditions, order_by: &OrderBy) -> SqlArgs {
        sql::select(&self.tablename, self.schema.iter(), where_, order_by)
    }

    /// Decodes a row into the fields. Every field present in the row becomes
    /// clean.
    ///
    /// # Panics
    ///
    /// Panics if the object is already bound to a different primary key.
    pub fn set_from_row(&mut self, row: &Row) {
        let new_pk = match row.get(&self.options.pk_fieldname) {
            Some(StorageValue::Integer(pk)) => Some(*pk),
            _ => None,
        };
        if let (Some(current), Some(new)) = (self.pk_value(), new_pk) {
            if current != new {
                panic!(
                    "Object in table '{}' is bound to {}={}; cannot rebind to {}",
                    self.tablename, self.options.pk_fieldname, current, new
                );
            }
        }
        for field in self.schema.iter_mut() {
            match row.get(field.name()) {
                Some(raw) => field.set_from_storage_value(raw.clone()),
                None => {
                    tracing::warn!(
                        "Column {}.{} missing from result row",
                        self.tablename,
                        field.name()
                    );
                }
            }
        }
    }

    /// After a load miss: an unbound object forgets any snapshot so the next
    /// save writes every field. A bound object keeps its identity.
    fn mark_unsaved(&mut self) {
        if self.pk_value().is_some() {
            tracing::warn!(
                "Reload of {} {}={:?} missed; keeping in-memory values",
                self.tablename,
                self.options.pk_fieldname,
                self.pk_value()
            );
            return;
        }
        for field in self.schema.iter_mut() {
            field.forget_persisted();
        }
    }

    // ------------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------------

    /// Writes the object: INSERT when unbound, otherwise UPDATE of the dirty
    /// columns plus `when_last_modified`. Saving a clean bound object does
    /// nothing. Any null mandatory field, dirty or not, fails the save before
    /// a statement runs.
    ///
    /// Runs in one transaction. Dirty flags and a newly allocated primary key
    /// are applied only after commit.
    pub fn save(&mut self, db: &Database) -> Result<(), DbError> {
        match self.pk_value() {
            None => self.save_insert(db).map(|_| ()),
            Some(pk) => self.save_update(db, pk),
        }
    }

    /// Returns the primary key, inserting the row first if the object is
    /// unbound.
    pub fn ensure_saved(&mut self, db: &Database) -> Result<i64, DbError> {
        match self.pk_value() {
            Some(pk) => Ok(pk),
            None => self.save_insert(db),
        }
    }

    fn save_insert(&mut self, db: &Database) -> Result<i64, DbError> {
        self.check_mandatory(self.schema.iter().filter(|f| !f.is_pk()))?;

        let stamped = self.timestamp_fields();
        let now = datetime::now();
        if self.options.has_creation_timestamp
            && self.value_is_null(dbconst::CREATION_TIMESTAMP_FIELDNAME)
        {
            self.set_value(dbconst::CREATION_TIMESTAMP_FIELDNAME, now);
        }
        if self.options.has_modification_timestamp {
            self.set_value(dbconst::MODIFICATION_TIMESTAMP_FIELDNAME, now);
        }

        let fields: Vec<&Field> = self.schema.iter().filter(|f| !f.is_pk()).collect();
        let args = sql::insert(&self.tablename, &fields);
        let pk = match db.transaction(|db| {
            db.execute(&args)?;
            Ok(db.last_insert_rowid())
        }) {
            Ok(pk) => pk,
            Err(e) => {
                self.restore_fields(stamped);
                return Err(e);
            }
        };

        self.schema
            .get_mut(&self.options.pk_fieldname)
            .set_from_storage_value(StorageValue::Integer(pk));
        self.clear_all_dirty();
        tracing::debug!("Inserted {} {}={}", self.tablename, self.options.pk_fieldname, pk);
        Ok(pk)
    }

    fn save_update(&mut self, db: &Database, pk: i64) -> Result<(), DbError> {
        if !self.is_dirty() {
            tracing::debug!("{} {}={}: nothing to save", self.tablename, self.options.pk_fieldname, pk);
            return Ok(());
        }
        // Clean cells count too: a column added by migration loads as null.
        self.check_mandatory(self.schema.iter().filter(|f| !f.is_pk()))?;

        if self.options.has_modification_timestamp {
            let field = self.schema.get_mut(dbconst::MODIFICATION_TIMESTAMP_FIELDNAME);
            field.set_value(datetime::now());
            // Same-millisecond saves would otherwise compare equal to the snapshot.
            field.set_dirty();
        }

        let fields: Vec<&Field> = self
            .schema
            .iter()
            .filter(|f| !f.is_pk() && f.is_dirty())
            .collect();
        let args = sql::update(&self.tablename, &fields, &self.options.pk_fieldname, pk);
        let changed = db.transaction(|db| db.execute(&args))?;
        if changed == 0 {
            tracing::warn!("{} {}={} vanished from storage", self.tablename, self.options.pk_fieldname, pk);
            return Err(DbError::RecordNotFound {
                table: self.tablename.clone(),
                pk,
            });
        }

        self.clear_all_dirty();
        tracing::debug!("Updated {} {}={}", self.tablename, self.options.pk_fieldname, pk);
        Ok(())
    }

    fn check_mandatory<'a>(
        &self,
        mut fields: impl Iterator<Item = &'a Field>,
    ) -> Result<(), DbError> {
        match fields.find(|f| !f.allows_null() && f.is_null()) {
            Some(field) => Err(DbError::MandatoryFieldNull {
                table: self.tablename.clone(),
                field: field.name().to_string(),
            }),
            None => Ok(()),
        }
    }

    fn timestamp_fields(&self) -> Vec<Field> {
        [
            dbconst::CREATION_TIMESTAMP_FIELDNAME,
            dbconst::MODIFICATION_TIMESTAMP_FIELDNAME,
        ]
        .into_iter()
        .filter_map(|name| self.schema.try_get(name).cloned())
        .collect()
    }

    fn restore_fields(&mut self, fields: Vec<Field>) {
        for field in fields {
            let name = field.name().to_string();
            *self.schema.get_mut(&name) = field;
        }
    }

    fn clear_all_dirty(&mut self) {
        for field in self.schema.iter_mut() {
            field.clear_dirty();
        }
    }

    // ------------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------------

    /// Deletes the backing row, if any, and returns the object to unbound.
    pub fn remove(&mut self, db: &Database) -> Result<(), DbError> {
        let Some(pk) = self.pk_value() else {
            return Ok(());
        };
        let args = sql::delete(&self.tablename, &self.options.pk_fieldname, pk);
        db.transaction(|db| db.execute(&args))?;
        self.schema.get_mut(&self.options.pk_fieldname).nullify();
        for field in self.schema.iter_mut() {
            field.forget_persisted();
        }
        tracing::debug!("Deleted {} {}={}", self.tablename, self.options.pk_fieldname, pk);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Schema maintenance and export
    // ------------------------------------------------------------------------

    /// Creates or migrates the backing table.
    pub fn make_table(&self, db: &Database) -> Result<MigrationReport, DbError> {
        migration::make_table(db, self)
    }

    /// Field values as a JSON object keyed by field name.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .schema
            .iter()
            .map(|f| (f.name().to_string(), f.value().to_json()))
            .collect();
        serde_json::Value::Object(map)
    }
}
