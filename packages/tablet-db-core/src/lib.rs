//! Record persistence engine for questionnaire tablets.
//!
//! Provides typed, dirty-tracked fields, schema-driven load/save/delete of
//! single rows, ancillary (one-to-many) loading, additive schema migration,
//! and a name-keyed task registry over an embedded SQLite store.

pub mod ancillary;
pub mod config;
pub mod database;
pub mod datetime;
pub mod error;
pub mod field;
pub mod migration;
pub mod record;
pub mod schema;
pub mod storedvar;
pub mod task;
pub mod types;

pub use database::{Database, OrderBy, SqlArgs, WhereConditions};
pub use error::DbError;
pub use field::Field;
pub use record::{DatabaseObject, DbRecord, ObjectOptions};
pub use types::{FieldType, Value};

/// Reserved column names shared with every external schema consumer.
pub mod dbconst {
    /// Primary key column.
    pub const PK_FIELDNAME: &str = "id";
    /// Creation timestamp column.
    pub const CREATION_TIMESTAMP_FIELDNAME: &str = "when_created";
    /// Last-modified timestamp column.
    pub const MODIFICATION_TIMESTAMP_FIELDNAME: &str = "when_last_modified";
    /// Flag marking rows excluded from the next offline sync.
    pub const MOVE_OFF_TABLET_FIELDNAME: &str = "_move_off_tablet";
    /// Sentinel primary key for records not backed by any row.
    pub const NONEXISTENT_PK: i64 = -1;
}
