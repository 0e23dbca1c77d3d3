//! Value cell: one typed, nullable, dirty-tracked column value.

use std::fmt;

use rusqlite::types::Value as StorageValue;

use crate::types::{FieldType, Value};

/// A single named column value with its constraints.
///
/// # Invariants
///
/// - A primary-key field is always unique and mandatory.
/// - The held value is always either null or of the declared type.
/// - `is_dirty()` is true iff the value differs from the last snapshot loaded
///   from or written to storage, or no such snapshot exists yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    ty: FieldType,
    value: Value,
    default_value: Value,
    pk: bool,
    unique: bool,
    mandatory: bool,
    set: bool,
    dirty: bool,
    persisted: Option<Value>,
}

impl Field {
    /// Creates a nullable, non-unique field holding null.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            value: Value::Null,
            default_value: Value::Null,
            pk: false,
            unique: false,
            mandatory: false,
            set: false,
            dirty: true,
            persisted: None,
        }
    }

    /// Creates a field from a type name.
    ///
    /// # Panics
    ///
    /// Panics if `type_name` is not a known field type.
    pub fn with_type_name(name: impl Into<String>, type_name: &str) -> Self {
        let name = name.into();
        match type_name.parse::<FieldType>() {
            Ok(ty) => Self::new(name, ty),
            Err(_) => panic!("Field '{}': unknown field type '{}'", name, type_name),
        }
    }

    /// Marks the field as the primary key (implies unique and mandatory).
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.pk = true;
        self.unique = true;
        self.mandatory = true;
        self
    }

    #[must_use]
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the default, which also becomes the value while the field is unset.
    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default_value = default.into().convert(self.ty);
        if !self.set {
            self.value = self.default_value.clone();
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> FieldType {
        self.ty
    }

    pub fn is_pk(&self) -> bool {
        self.pk
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    /// Whether the value has ever been assigned or loaded.
    pub fn is_set(&self) -> bool {
        self.set
    }

    pub fn default_value(&self) -> &Value {
        &self.default_value
    }

    /// Whether storage may hold NULL in this column.
    pub fn allows_null(&self) -> bool {
        !(self.mandatory || self.pk)
    }

    /// Column type and constraint clause for `CREATE TABLE`.
    pub fn column_definition(&self) -> String {
        let mut def = self.ty.sql_column_type().to_string();
        if self.pk {
            def.push_str(" PRIMARY KEY");
        }
        if self.unique && !self.pk {
            def.push_str(" UNIQUE");
        }
        if !self.allows_null() {
            def.push_str(" NOT NULL");
        }
        def
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Assigns a value, coercing it to the declared type.
    ///
    /// Returns whether the held value changed (always true for the first
    /// assignment).
    pub fn set_value(&mut self, value: impl Into<Value>) -> bool {
        let value = value.into().convert(self.ty);
        let changed = !self.set || value != self.value;
        self.value = value;
        self.set = true;
        self.refresh_dirty();
        changed
    }

    /// Sets the value to null. Returns whether the held value changed.
    pub fn nullify(&mut self) -> bool {
        self.set_value(Value::Null)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Forces the field to be written on the next save.
    pub fn set_dirty(&mut self) {
        self.dirty = true;
    }

    /// Records the current value as persisted.
    pub fn clear_dirty(&mut self) {
        self.persisted = Some(self.value.clone());
        self.dirty = false;
    }

    /// Forgets the persisted snapshot; the field becomes dirty.
    pub(crate) fn forget_persisted(&mut self) {
        self.persisted = None;
        self.dirty = true;
    }

    /// Loads a raw value read from storage. The field becomes clean.
    pub fn set_from_storage_value(&mut self, raw: StorageValue) {
        self.value = Value::from_storage(raw, self.ty);
        self.set = true;
        self.clear_dirty();
    }

    /// Encodes the value for storage.
    pub fn storage_value(&self) -> StorageValue {
        self.value.to_storage()
    }

    /// Human-readable value.
    pub fn pretty_value(&self) -> String {
        self.value.to_string()
    }

    fn refresh_dirty(&mut self) {
        self.dirty = match &self.persisted {
            Some(persisted) => *persisted != self.value,
            None => true,
        };
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_null() {
            write!(f, "{}=NULL ({})", self.name, self.ty)?;
        } else {
            write!(f, "{}={}", self.name, self.value)?;
        }
        if self.dirty {
            write!(f, " (*)")?;
        }
        Ok(())
    }
}
