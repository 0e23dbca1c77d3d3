//! Storage handle over a single SQLite connection.
//!
//! One handle is opened at startup and passed by reference to every record
//! operation. The handle is not `Sync`: the persistence layer is driven from a
//! single thread.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use rusqlite::types::Value as StorageValue;
use rusqlite::{params_from_iter, Connection};

use crate::config::DbConfig;
use crate::error::DbError;
use crate::types::Value;

/// A statement with its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlArgs {
    pub sql: String,
    pub args: Vec<StorageValue>,
}

impl SqlArgs {
    pub fn new(sql: impl Into<String>, args: Vec<StorageValue>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }

    pub fn sql_only(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

impl fmt::Display for SqlArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.sql, self.args)
    }
}

/// Conjunction of `column = value` conditions.
///
/// A null value produces `column IS NULL`.
#[derive(Debug, Clone, Default)]
pub struct WhereConditions {
    conditions: Vec<(String, Value)>,
}

impl WhereConditions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add(column, value);
        self
    }

    pub fn add(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.conditions.push((column.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Renders ` WHERE ...` (or nothing) and appends the bound arguments.
    pub fn sql_clause(&self, args: &mut Vec<StorageValue>) -> String {
        if self.conditions.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .conditions
            .iter()
            .map(|(column, value)| {
                if value.is_null() {
                    format!("{} IS NULL", delimit(column))
                } else {
                    args.push(value.to_storage());
                    format!("{} = ?", delimit(column))
                }
            })
            .collect();
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// Ordering specification.
#[derive(Debug, Clone, Default)]
pub struct OrderBy {
    columns: Vec<(String, bool)>,
}

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn asc(mut self, column: impl Into<String>) -> Self {
        self.columns.push((column.into(), true));
        self
    }

    #[must_use]
    pub fn desc(mut self, column: impl Into<String>) -> Self {
        self.columns.push((column.into(), false));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Renders ` ORDER BY ...` (or nothing).
    pub fn sql_clause(&self) -> String {
        if self.columns.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = self
            .columns
            .iter()
            .map(|(column, asc)| {
                format!("{} {}", delimit(column), if *asc { "ASC" } else { "DESC" })
            })
            .collect();
        format!(" ORDER BY {}", parts.join(", "))
    }
}

/// One result row with its column names.
#[derive(Debug, Clone)]
pub struct Row {
    columns: Rc<[String]>,
    values: Vec<StorageValue>,
}

impl Row {
    /// Raw value of the named column (case-insensitive).
    pub fn get(&self, column: &str) -> Option<&StorageValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .map(|i| &self.values[i])
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[StorageValue] {
        &self.values
    }
}

/// Quotes an identifier for SQLite.
pub fn delimit(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Process-wide storage handle.
pub struct Database {
    conn: Connection,
    recorded: RefCell<Option<Vec<SqlArgs>>>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl Database {
    /// Opens (creating if necessary) the file named by the configuration.
    pub fn open(config: &DbConfig) -> Result<Self, DbError> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&config.database_path)?;
        tracing::info!("Opened database {}", config.database_path.display());
        Self::configure(conn, config, true)
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory(config: &DbConfig) -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::configure(conn, config, false)
    }

    fn configure(conn: Connection, config: &DbConfig, on_disk: bool) -> Result<Self, DbError> {
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        if config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        }
        if on_disk && !config.journal_mode.is_empty() {
            let mode: String = conn.query_row(
                &format!("PRAGMA journal_mode = {}", config.journal_mode),
                [],
                |row| row.get(0),
            )?;
            tracing::debug!("Journal mode: {}", mode);
        }
        Ok(Self {
            conn,
            recorded: RefCell::new(config.record_statements.then(Vec::new)),
        })
    }

    /// Underlying connection, for statements outside the record layer.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Executes a statement, returning the number of changed rows.
    pub fn execute(&self, args: &SqlArgs) -> Result<usize, DbError> {
        tracing::debug!("Executing: {}", args);
        self.record(args);
        let changed = self.conn.execute(&args.sql, params_from_iter(args.args.iter()))?;
        Ok(changed)
    }

    /// Runs a query and collects every row.
    pub fn query(&self, args: &SqlArgs) -> Result<Vec<Row>, DbError> {
        tracing::debug!("Querying: {}", args);
        self.record(args);
        let mut stmt = self.conn.prepare(&args.sql)?;
        let columns: Rc<[String]> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
            .into();
        let mut rows = stmt.query(params_from_iter(args.args.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(row.get::<_, StorageValue>(i)?);
            }
            out.push(Row {
                columns: Rc::clone(&columns),
                values,
            });
        }
        Ok(out)
    }

    /// Rowid allocated by the most recent successful INSERT.
    pub fn last_insert_rowid(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    /// Runs `f` inside one transaction, committing on `Ok` and rolling back
    /// on `Err`. Nested calls join the outer transaction.
    pub fn transaction<T, F>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Self) -> Result<T, DbError>,
    {
        if !self.conn.is_autocommit() {
            return f(self);
        }
        let tx = self.conn.unchecked_transaction()?;
        let result = f(self)?;
        tx.commit()?;
        Ok(result)
    }

    pub fn table_exists(&self, table: &str) -> Result<bool, DbError> {
        let rows = self.query(&SqlArgs::new(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            vec![StorageValue::Text(table.to_string())],
        ))?;
        Ok(!rows.is_empty())
    }

    /// Column names of an existing table, in table order.
    pub fn column_names(&self, table: &str) -> Result<Vec<String>, DbError> {
        let rows = self.query(&SqlArgs::sql_only(format!(
            "PRAGMA table_info({})",
            delimit(table)
        )))?;
        Ok(rows
            .iter()
            .filter_map(|row| match row.get("name") {
                Some(StorageValue::Text(name)) => Some(name.clone()),
                _ => None,
            })
            .collect())
    }

    /// Number of rows in a table.
    pub fn count(&self, table: &str, where_: &WhereConditions) -> Result<i64, DbError> {
        let mut args = Vec::new();
        let clause = where_.sql_clause(&mut args);
        let sql = format!("SELECT COUNT(*) FROM {}{}", delimit(table), clause);
        let rows = self.query(&SqlArgs::new(sql, args))?;
        Ok(match rows.first().and_then(|r| r.values().first()) {
            Some(StorageValue::Integer(n)) => *n,
            _ => 0,
        })
    }

    /// Starts or stops keeping a log of executed statements.
    pub fn set_record_statements(&self, on: bool) {
        *self.recorded.borrow_mut() = on.then(Vec::new);
    }

    /// Returns and clears the statement log.
    pub fn take_recorded_statements(&self) -> Vec<SqlArgs> {
        self.recorded
            .borrow_mut()
            .as_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    }

    fn record(&self, args: &SqlArgs) {
        if let Some(log) = self.recorded.borrow_mut().as_mut() {
            log.push(args.clone());
        }
    }
}
