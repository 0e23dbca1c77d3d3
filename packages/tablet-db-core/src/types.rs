//! Semantic field types and the nullable value domain.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rusqlite::types::Value as StorageValue;
use uuid::Uuid;

use crate::datetime;
use crate::error::DbError;

/// Closed set of semantic types a field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// 64-bit signed integer
    Integer,
    /// Double precision floating point
    Real,
    /// Boolean, stored as integer 0/1
    Boolean,
    /// UTF-8 text
    Text,
    /// Calendar date, stored as `YYYY-MM-DD`
    Date,
    /// Datetime with UTC offset, stored as ISO-8601 text with milliseconds
    DateTime,
    /// Raw bytes
    Blob,
    /// UUID, stored as hyphenated text
    Uuid,
}

impl FieldType {
    /// SQLite column type for this field type.
    pub fn sql_column_type(&self) -> &'static str {
        match self {
            FieldType::Integer | FieldType::Boolean => "INTEGER",
            FieldType::Real => "REAL",
            FieldType::Text | FieldType::Date | FieldType::DateTime | FieldType::Uuid => "TEXT",
            FieldType::Blob => "BLOB",
        }
    }

    /// Lowercase name used in `Display` and `FromStr`.
    pub fn name(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Real => "real",
            FieldType::Boolean => "boolean",
            FieldType::Text => "text",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Blob => "blob",
            FieldType::Uuid => "uuid",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(FieldType::Integer),
            "real" | "double" => Ok(FieldType::Real),
            "boolean" | "bool" => Ok(FieldType::Boolean),
            "text" | "string" => Ok(FieldType::Text),
            "date" => Ok(FieldType::Date),
            "datetime" => Ok(FieldType::DateTime),
            "blob" => Ok(FieldType::Blob),
            "uuid" => Ok(FieldType::Uuid),
            _ => Err(DbError::UnknownFieldType(s.to_string())),
        }
    }
}

/// A nullable value of one of the [`FieldType`]s.
///
/// Structural equality (`==`) treats two nulls as equal and is what dirty
/// tracking uses. Record and task logic that needs relational semantics uses
/// [`Value::sql_eq`] instead, where null equals nothing.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Real(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Blob(Vec<u8>),
    Uuid(Uuid),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Type of a non-null value.
    pub fn ty(&self) -> Option<FieldType> {
        match self {
            Value::Null => None,
            Value::Int(_) => Some(FieldType::Integer),
            Value::Real(_) => Some(FieldType::Real),
            Value::Bool(_) => Some(FieldType::Boolean),
            Value::Text(_) => Some(FieldType::Text),
            Value::Date(_) => Some(FieldType::Date),
            Value::DateTime(_) => Some(FieldType::DateTime),
            Value::Blob(_) => Some(FieldType::Blob),
            Value::Uuid(_) => Some(FieldType::Uuid),
        }
    }

    /// Equality under SQL three-valued logic: false if either side is null.
    pub fn sql_eq(&self, other: &Value) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        self == other
    }

    /// Inequality under SQL three-valued logic: false if either side is null.
    pub fn sql_ne(&self, other: &Value) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        self != other
    }

    /// Converts to the given type. Values that cannot be converted become null.
    pub fn convert(self, ty: FieldType) -> Value {
        match (ty, self) {
            (_, Value::Null) => Value::Null,

            (FieldType::Integer, Value::Int(i)) => Value::Int(i),
            (FieldType::Integer, Value::Real(f)) if f.is_finite() => Value::Int(f.round() as i64),
            (FieldType::Integer, Value::Bool(b)) => Value::Int(b as i64),
            (FieldType::Integer, Value::Text(s)) => parse_int(&s).map_or(Value::Null, Value::Int),

            (FieldType::Real, Value::Real(f)) => Value::Real(f),
            (FieldType::Real, Value::Int(i)) => Value::Real(i as f64),
            (FieldType::Real, Value::Bool(b)) => Value::Real(if b { 1.0 } else { 0.0 }),
            (FieldType::Real, Value::Text(s)) => {
                s.trim().parse::<f64>().map_or(Value::Null, Value::Real)
            }

            (FieldType::Boolean, Value::Bool(b)) => Value::Bool(b),
            (FieldType::Boolean, Value::Int(i)) => Value::Bool(i != 0),
            (FieldType::Boolean, Value::Real(f)) => Value::Bool(f != 0.0),
            (FieldType::Boolean, Value::Text(s)) => {
                let s = s.trim().to_ascii_lowercase();
                Value::Bool(!(s.is_empty() || s == "0" || s == "false"))
            }

            (FieldType::Text, Value::Text(s)) => Value::Text(s),
            (FieldType::Text, Value::Int(i)) => Value::Text(i.to_string()),
            (FieldType::Text, Value::Real(f)) => Value::Text(f.to_string()),
            (FieldType::Text, Value::Bool(b)) => Value::Text(b.to_string()),
            (FieldType::Text, Value::Date(d)) => Value::Text(datetime::to_iso_date(&d)),
            (FieldType::Text, Value::DateTime(dt)) => Value::Text(datetime::to_iso_ms(&dt)),
            (FieldType::Text, Value::Uuid(u)) => Value::Text(u.hyphenated().to_string()),
            (FieldType::Text, Value::Blob(b)) => {
                String::from_utf8(b).map_or(Value::Null, Value::Text)
            }

            (FieldType::Date, Value::Date(d)) => Value::Date(d),
            (FieldType::Date, Value::DateTime(dt)) => Value::Date(dt.date_naive()),
            (FieldType::Date, Value::Text(s)) => {
                datetime::from_iso_date(&s).map_or(Value::Null, Value::Date)
            }

            (FieldType::DateTime, Value::DateTime(dt)) => Value::DateTime(dt),
            (FieldType::DateTime, Value::Text(s)) => {
                datetime::from_iso(&s).map_or(Value::Null, Value::DateTime)
            }

            (FieldType::Blob, Value::Blob(b)) => Value::Blob(b),
            (FieldType::Blob, Value::Text(s)) => Value::Blob(s.into_bytes()),

            (FieldType::Uuid, Value::Uuid(u)) => Value::Uuid(u),
            (FieldType::Uuid, Value::Text(s)) => {
                Uuid::parse_str(s.trim()).map_or(Value::Null, Value::Uuid)
            }
            (FieldType::Uuid, Value::Blob(b)) => Uuid::from_slice(&b).map_or(Value::Null, Value::Uuid),

            _ => Value::Null,
        }
    }

    /// Encodes for SQLite.
    pub fn to_storage(&self) -> StorageValue {
        match self {
            Value::Null => StorageValue::Null,
            Value::Int(i) => StorageValue::Integer(*i),
            Value::Real(f) => StorageValue::Real(*f),
            Value::Bool(b) => StorageValue::Integer(*b as i64),
            Value::Text(s) => StorageValue::Text(s.clone()),
            Value::Date(d) => StorageValue::Text(datetime::to_iso_date(d)),
            Value::DateTime(dt) => StorageValue::Text(datetime::to_iso_ms(dt)),
            Value::Blob(b) => StorageValue::Blob(b.clone()),
            Value::Uuid(u) => StorageValue::Text(u.hyphenated().to_string()),
        }
    }

    /// Decodes a raw SQLite value into the given type.
    ///
    /// Empty text decodes to null for every type except `Text`.
    pub fn from_storage(raw: StorageValue, ty: FieldType) -> Value {
        let value = match raw {
            StorageValue::Null => return Value::Null,
            StorageValue::Text(s) if s.is_empty() && ty != FieldType::Text => return Value::Null,
            StorageValue::Integer(i) => Value::Int(i),
            StorageValue::Real(f) => Value::Real(f),
            StorageValue::Text(s) => Value::Text(s),
            StorageValue::Blob(b) => Value::Blob(b),
        };
        value.convert(ty)
    }

    /// JSON rendering for diagnostics and export.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Real(f) => serde_json::Value::from(*f),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(datetime::to_iso_date(d)),
            Value::DateTime(dt) => serde_json::Value::String(datetime::to_iso_ms(dt)),
            Value::Blob(b) => serde_json::Value::from(b.clone()),
            Value::Uuid(u) => serde_json::Value::String(u.hyphenated().to_string()),
        }
    }
}

fn parse_int(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.round() as i64)
    })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Real(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Text(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", datetime::to_iso_date(d)),
            Value::DateTime(dt) => write!(f, "{}", datetime::to_iso_ms(dt)),
            Value::Blob(b) => write!(f, "<blob: {} bytes>", b.len()),
            Value::Uuid(u) => write!(f, "{}", u.hyphenated()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::DateTime(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_column_types() {
        assert_eq!(FieldType::Integer.sql_column_type(), "INTEGER");
        assert_eq!(FieldType::Boolean.sql_column_type(), "INTEGER");
        assert_eq!(FieldType::Real.sql_column_type(), "REAL");
        assert_eq!(FieldType::Text.sql_column_type(), "TEXT");
        assert_eq!(FieldType::Date.sql_column_type(), "TEXT");
        assert_eq!(FieldType::DateTime.sql_column_type(), "TEXT");
        assert_eq!(FieldType::Uuid.sql_column_type(), "TEXT");
        assert_eq!(FieldType::Blob.sql_column_type(), "BLOB");
    }

    #[test]
    fn test_field_type_names_round_trip() {
        for ty in [
            FieldType::Integer,
            FieldType::Real,
            FieldType::Boolean,
            FieldType::Text,
            FieldType::Date,
            FieldType::DateTime,
            FieldType::Blob,
            FieldType::Uuid,
        ] {
            assert_eq!(ty.to_string().parse::<FieldType>().unwrap(), ty);
        }
        assert!(matches!(
            "decimal".parse::<FieldType>(),
            Err(DbError::UnknownFieldType(_))
        ));
    }

    #[test]
    fn test_null_never_sql_equal() {
        assert!(!Value::Null.sql_eq(&Value::Null));
        assert!(!Value::Null.sql_eq(&Value::Int(1)));
        assert!(!Value::Int(1).sql_eq(&Value::Null));
        assert!(!Value::Null.sql_ne(&Value::Int(1)));
        assert!(Value::Int(1).sql_eq(&Value::Int(1)));
        assert!(Value::Int(1).sql_ne(&Value::Int(2)));
    }

    #[test]
    fn test_convert_numeric_and_bool() {
        assert_eq!(Value::Real(2.6).convert(FieldType::Integer), Value::Int(3));
        assert_eq!(Value::Bool(true).convert(FieldType::Integer), Value::Int(1));
        assert_eq!(Value::Int(0).convert(FieldType::Boolean), Value::Bool(false));
        assert_eq!(Value::from("false").convert(FieldType::Boolean), Value::Bool(false));
        assert_eq!(Value::from("yes").convert(FieldType::Boolean), Value::Bool(true));
        assert_eq!(Value::from(" 42 ").convert(FieldType::Integer), Value::Int(42));
        assert_eq!(Value::from("1.5").convert(FieldType::Real), Value::Real(1.5));
    }

    #[test]
    fn test_convert_failure_is_null() {
        assert_eq!(Value::from("abc").convert(FieldType::Integer), Value::Null);
        assert_eq!(Value::from("abc").convert(FieldType::Real), Value::Null);
        assert_eq!(Value::from("abc").convert(FieldType::DateTime), Value::Null);
        assert_eq!(Value::from("not-a-uuid").convert(FieldType::Uuid), Value::Null);
        assert_eq!(Value::Real(f64::NAN).convert(FieldType::Integer), Value::Null);
        assert_eq!(Value::Int(3).convert(FieldType::Date), Value::Null);
    }

    #[test]
    fn test_storage_encoding() {
        let u = Uuid::new_v4();
        assert_eq!(Value::Bool(true).to_storage(), StorageValue::Integer(1));
        assert_eq!(
            Value::Uuid(u).to_storage(),
            StorageValue::Text(u.hyphenated().to_string())
        );
        assert_eq!(
            Value::from_storage(StorageValue::Text(u.hyphenated().to_string()), FieldType::Uuid),
            Value::Uuid(u)
        );
        assert_eq!(
            Value::from_storage(StorageValue::Integer(0), FieldType::Boolean),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_empty_storage_text_decodes_to_null_except_text() {
        let empty = || StorageValue::Text(String::new());
        assert_eq!(Value::from_storage(empty(), FieldType::DateTime), Value::Null);
        assert_eq!(Value::from_storage(empty(), FieldType::Integer), Value::Null);
        assert_eq!(Value::from_storage(empty(), FieldType::Text), Value::Text(String::new()));
        assert_eq!(Value::from_storage(StorageValue::Null, FieldType::Text), Value::Null);
    }

    #[test]
    fn test_option_into_value() {
        let none: Option<i64> = None;
        assert_eq!(Value::from(none), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Text("x".to_string()));
    }
}
