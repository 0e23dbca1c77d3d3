//! Statement builders for the record engine.

use rusqlite::types::Value as StorageValue;

use crate::database::{delimit, OrderBy, SqlArgs, WhereConditions};
use crate::field::Field;

fn column_list<'a>(fields: impl Iterator<Item = &'a Field>) -> String {
    fields
        .map(|f| delimit(f.name()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `SELECT <all columns> FROM t [WHERE ...] [ORDER BY ...]`.
pub(crate) fn select<'a>(
    table: &str,
    fields: impl Iterator<Item = &'a Field>,
    where_: &WhereConditions,
    order_by: &OrderBy,
) -> SqlArgs {
    let mut args = Vec::new();
    let where_clause = where_.sql_clause(&mut args);
    let sql = format!(
        "SELECT {} FROM {}{}{}",
        column_list(fields),
        delimit(table),
        where_clause,
        order_by.sql_clause()
    );
    SqlArgs::new(sql, args)
}

/// `INSERT INTO t (cols) VALUES (?, ...)`, or `DEFAULT VALUES` with no columns.
pub(crate) fn insert(table: &str, fields: &[&Field]) -> SqlArgs {
    if fields.is_empty() {
        return SqlArgs::sql_only(format!("INSERT INTO {} DEFAULT VALUES", delimit(table)));
    }
    let placeholders = vec!["?"; fields.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        delimit(table),
        column_list(fields.iter().copied()),
        placeholders
    );
    SqlArgs::new(sql, fields.iter().map(|f| f.storage_value()).collect())
}

/// `UPDATE t SET a = ?, ... WHERE pk = ?`.
pub(crate) fn update(table: &str, fields: &[&Field], pk_fieldname: &str, pk: i64) -> SqlArgs {
    let assignments = fields
        .iter()
        .map(|f| format!("{} = ?", delimit(f.name())))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        delimit(table),
        assignments,
        delimit(pk_fieldname)
    );
    let mut args: Vec<StorageValue> = fields.iter().map(|f| f.storage_value()).collect();
    args.push(StorageValue::Integer(pk));
    SqlArgs::new(sql, args)
}

/// `DELETE FROM t WHERE pk = ?`.
pub(crate) fn delete(table: &str, pk_fieldname: &str, pk: i64) -> SqlArgs {
    SqlArgs::new(
        format!(
            "DELETE FROM {} WHERE {} = ?",
            delimit(table),
            delimit(pk_fieldname)
        ),
        vec![StorageValue::Integer(pk)],
    )
}

/// `CREATE TABLE t (col def, ...)`.
pub(crate) fn create_table<'a>(table: &str, fields: impl Iterator<Item = &'a Field>) -> SqlArgs {
    let columns = fields
        .map(|f| format!("{} {}", delimit(f.name()), f.column_definition()))
        .collect::<Vec<_>>()
        .join(", ");
    SqlArgs::sql_only(format!("CREATE TABLE {} ({})", delimit(table), columns))
}

/// `ALTER TABLE t ADD COLUMN col TYPE`. Constraints are not attached.
pub(crate) fn add_column(table: &str, field: &Field) -> SqlArgs {
    SqlArgs::sql_only(format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        delimit(table),
        delimit(field.name()),
        field.ty().sql_column_type()
    ))
}
