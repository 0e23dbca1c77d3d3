//! Table builder: creates a record type's table or adds its missing columns.
//!
//! Migration is additive only. Columns are never dropped, renamed, or
//! retyped; on-disk columns the schema no longer declares are left in place
//! and reported.

use serde::Serialize;

use crate::database::Database;
use crate::error::DbError;
use crate::record::{sql, DatabaseObject};

/// What `make_table` did to one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub table: String,
    /// The table did not exist and was created.
    pub created: bool,
    /// Columns added with `ALTER TABLE`, in declaration order.
    pub added_columns: Vec<String>,
    /// Columns present on disk but not declared.
    pub unexpected_columns: Vec<String>,
}

impl MigrationReport {
    /// Whether the table was already up to date.
    pub fn is_unchanged(&self) -> bool {
        !self.created && self.added_columns.is_empty()
    }
}

/// `CREATE TABLE` statement for the object's full schema.
pub fn create_table_sql(object: &DatabaseObject) -> String {
    sql::create_table(object.tablename(), object.schema().iter()).sql
}

/// Ensures `object`'s table exists with every declared column.
///
/// Runs in one transaction. Column names compare case-insensitively, as
/// SQLite does.
pub fn make_table(db: &Database, object: &DatabaseObject) -> Result<MigrationReport, DbError> {
    let table = object.tablename();
    db.transaction(|db| {
        let mut report = MigrationReport {
            table: table.to_string(),
            ..MigrationReport::default()
        };

        if !db.table_exists(table)? {
            db.execute(&sql::create_table(table, object.schema().iter()))?;
            tracing::info!("Created table {}", table);
            report.created = true;
            return Ok(report);
        }

        let existing = db.column_names(table)?;
        let has_column =
            |name: &str| existing.iter().any(|c| c.eq_ignore_ascii_case(name));

        for field in object.schema().iter() {
            if has_column(field.name()) {
                continue;
            }
            if !field.allows_null() || field.is_unique() {
                tracing::warn!(
                    "Adding {}.{} without its NOT NULL/UNIQUE constraint",
                    table,
                    field.name()
                );
            }
            db.execute(&sql::add_column(table, field))?;
            tracing::info!("Added column {}.{}", table, field.name());
            report.added_columns.push(field.name().to_string());
        }

        report.unexpected_columns = existing
            .into_iter()
            .filter(|c| !object.schema().iter().any(|f| f.name().eq_ignore_ascii_case(c)))
            .collect();
        for column in &report.unexpected_columns {
            tracing::warn!("Table {} has undeclared column {}", table, column);
        }
        Ok(report)
    })
}
