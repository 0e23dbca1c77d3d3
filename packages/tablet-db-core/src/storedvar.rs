//! Named, typed configuration variables persisted in the `storedvar` table.

use crate::database::{delimit, Database, SqlArgs};
use crate::error::DbError;
use crate::field::Field;
use crate::migration::MigrationReport;
use crate::record::{DatabaseObject, DbRecord};
use crate::types::{FieldType, Value};

pub const STOREDVAR_TABLENAME: &str = "storedvar";
pub const NAME_FIELDNAME: &str = "name";
pub const TYPE_FIELDNAME: &str = "type";
pub const VALUE_INTEGER_FIELDNAME: &str = "valueInteger";
pub const VALUE_REAL_FIELDNAME: &str = "valueReal";
pub const VALUE_TEXT_FIELDNAME: &str = "valueText";

/// Column holding values of `ty`.
///
/// # Panics
///
/// Panics for types stored variables do not support.
fn value_fieldname(ty: FieldType) -> &'static str {
    match ty {
        FieldType::Integer | FieldType::Boolean => VALUE_INTEGER_FIELDNAME,
        FieldType::Real => VALUE_REAL_FIELDNAME,
        FieldType::Text => VALUE_TEXT_FIELDNAME,
        other => panic!("Stored variables cannot hold type '{}'", other),
    }
}

/// One stored variable.
#[derive(Debug, Clone)]
pub struct StoredVar {
    object: DatabaseObject,
    ty: FieldType,
}

impl StoredVar {
    fn blank(ty: FieldType) -> Self {
        let mut object = DatabaseObject::new(STOREDVAR_TABLENAME);
        object
            .add_field(Field::new(NAME_FIELDNAME, FieldType::Text).mandatory().unique())
            .add_field(Field::new(TYPE_FIELDNAME, FieldType::Text).mandatory())
            .add_field(Field::new(VALUE_INTEGER_FIELDNAME, FieldType::Integer))
            .add_field(Field::new(VALUE_REAL_FIELDNAME, FieldType::Real))
            .add_field(Field::new(VALUE_TEXT_FIELDNAME, FieldType::Text));
        Self { object, ty }
    }

    pub fn make_table(db: &Database) -> Result<MigrationReport, DbError> {
        Self::blank(FieldType::Text).object.make_table(db)
    }

    /// Loads the variable `name`, creating it with `default` if absent.
    ///
    /// A variable stored with a different type is converted to `ty` and
    /// rewritten.
    ///
    /// # Panics
    ///
    /// Panics if `ty` is not Integer, Boolean, Real or Text.
    pub fn open(
        db: &Database,
        name: &str,
        ty: FieldType,
        default: impl Into<Value>,
    ) -> Result<Self, DbError> {
        let column = value_fieldname(ty);
        if let Some(mut var) = Self::load(db, name)? {
            if var.ty != ty {
                tracing::warn!(
                    "Stored variable {} changes type from {} to {}",
                    name,
                    var.ty,
                    ty
                );
                let value = var.value();
                var.object.nullify(value_fieldname(var.ty));
                var.ty = ty;
                var.object.set_value(TYPE_FIELDNAME, ty.name());
                var.object.set_value(column, value.convert(ty));
                var.object.save(db)?;
            }
            return Ok(var);
        }

        let mut var = Self::blank(ty);
        var.object.set_value(NAME_FIELDNAME, name);
        var.object.set_value(TYPE_FIELDNAME, ty.name());
        var.object.set_value(column, default.into().convert(ty));
        var.object.save(db)?;
        tracing::debug!("Created stored variable {} ({})", name, ty);
        Ok(var)
    }

    /// Loads the variable `name` with its stored type.
    ///
    /// # Returns
    /// `Ok(None)` if no such variable exists.
    pub fn load(db: &Database, name: &str) -> Result<Option<Self>, DbError> {
        let mut var = Self::blank(FieldType::Text);
        if !var.object.load_by(db, NAME_FIELDNAME, name)? {
            return Ok(None);
        }
        let type_name = var.object.value_string(TYPE_FIELDNAME).unwrap_or_default();
        let ty: FieldType = type_name.parse()?;
        if !matches!(
            ty,
            FieldType::Integer | FieldType::Boolean | FieldType::Real | FieldType::Text
        ) {
            return Err(DbError::UnknownFieldType(type_name.to_string()));
        }
        var.ty = ty;
        Ok(Some(var))
    }

    /// Every stored variable, by name.
    pub fn names(db: &Database) -> Result<Vec<String>, DbError> {
        let rows = db.query(&SqlArgs::sql_only(format!(
            "SELECT {0} FROM {1} ORDER BY {0}",
            delimit(NAME_FIELDNAME),
            delimit(STOREDVAR_TABLENAME)
        )))?;
        Ok(rows
            .iter()
            .filter_map(|row| match row.get(NAME_FIELDNAME) {
                Some(rusqlite::types::Value::Text(name)) => Some(name.clone()),
                _ => None,
            })
            .collect())
    }

    pub fn name(&self) -> &str {
        self.object.value_string(NAME_FIELDNAME).unwrap_or_default()
    }

    pub fn ty(&self) -> FieldType {
        self.ty
    }

    pub fn value(&self) -> Value {
        self.object
            .value(value_fieldname(self.ty))
            .clone()
            .convert(self.ty)
    }

    /// Assigns and saves immediately. Returns whether the value changed.
    pub fn set_value(&mut self, db: &Database, value: impl Into<Value>) -> Result<bool, DbError> {
        let value = value.into().convert(self.ty);
        let changed = self.object.set_value(value_fieldname(self.ty), value);
        self.object.save(db)?;
        Ok(changed)
    }
}

impl DbRecord for StoredVar {
    fn object(&self) -> &DatabaseObject {
        &self.object
    }

    fn object_mut(&mut self) -> &mut DatabaseObject {
        &mut self.object
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use ntest::timeout;

    fn test_db() -> Database {
        let db = Database::open_in_memory(&DbConfig::default()).unwrap();
        StoredVar::make_table(&db).unwrap();
        db
    }

    #[timeout(1000)]
    #[test]
    fn test_open_creates_with_default() {
        let db = test_db();
        let var = StoredVar::open(&db, "questionnaireSize", FieldType::Real, 1.5).unwrap();
        assert_eq!(var.value(), Value::Real(1.5));
        assert_eq!(var.name(), "questionnaireSize");

        let loaded = StoredVar::load(&db, "questionnaireSize").unwrap().unwrap();
        assert_eq!(loaded.ty(), FieldType::Real);
        assert_eq!(loaded.value(), Value::Real(1.5));
    }

    #[timeout(1000)]
    #[test]
    fn test_boolean_uses_integer_column() {
        let db = test_db();
        let mut var = StoredVar::open(&db, "offerUploadAfterEdit", FieldType::Boolean, false).unwrap();
        assert!(var.set_value(&db, true).unwrap());
        assert!(!var.set_value(&db, true).unwrap());
        assert_eq!(var.object().value_int(VALUE_INTEGER_FIELDNAME), Some(1));

        let reopened = StoredVar::open(&db, "offerUploadAfterEdit", FieldType::Boolean, false).unwrap();
        assert_eq!(reopened.value(), Value::Bool(true));
    }

    #[timeout(1000)]
    #[test]
    fn test_reopen_with_new_type_converts() {
        let db = test_db();
        StoredVar::open(&db, "serverPort", FieldType::Text, "443").unwrap();
        let var = StoredVar::open(&db, "serverPort", FieldType::Integer, 0).unwrap();
        assert_eq!(var.value(), Value::Int(443));
        assert!(var.object().value_is_null(VALUE_TEXT_FIELDNAME));
        assert_eq!(StoredVar::names(&db).unwrap(), vec!["serverPort".to_string()]);
    }

    #[timeout(1000)]
    #[test]
    fn test_load_missing() {
        let db = test_db();
        assert!(StoredVar::load(&db, "nope").unwrap().is_none());
    }

    #[test]
    #[should_panic(expected = "cannot hold type")]
    fn test_unsupported_type_is_fatal() {
        let db = test_db();
        let _ = StoredVar::open(&db, "d", FieldType::Date, Value::Null);
    }
}
