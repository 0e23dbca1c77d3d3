//! One-to-many loading of ancillary records.
//!
//! A parent owns its children only through the children's foreign-key
//! column. Collections are rebuilt from storage on every load, never patched.

use crate::database::{Database, OrderBy, WhereConditions};
use crate::record::DbRecord;

/// Replaces `out` with every `T` whose `fk_name` column equals `parent_pk`,
/// in `order_by` order.
///
/// `make` constructs an unbound instance; it is called once for the query
/// and once per row. A failed query leaves `out` empty.
pub fn load_ancillary<T, F>(
    out: &mut Vec<T>,
    db: &Database,
    make: F,
    fk_name: &str,
    order_by: &OrderBy,
    parent_pk: i64,
) where
    T: DbRecord,
    F: Fn() -> T,
{
    out.clear();
    let specimen = make();
    let args = specimen
        .object()
        .fetch_query_sql(&WhereConditions::new().with(fk_name, parent_pk), order_by);
    let rows = match db.query(&args) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(
                "Ancillary query on {} for {}={} failed: {}",
                specimen.object().tablename(),
                fk_name,
                parent_pk,
                e
            );
            return;
        }
    };
    out.reserve(rows.len());
    for row in &rows {
        let mut item = make();
        item.object_mut().set_from_row(row);
        out.push(item);
    }
    tracing::debug!(
        "Loaded {} ancillary rows from {} for {}={}",
        out.len(),
        specimen.object().tablename(),
        fk_name,
        parent_pk
    );
}

/// Convenience form of [`load_ancillary`] returning a fresh vector.
pub fn fetch_ancillary<T, F>(
    db: &Database,
    make: F,
    fk_name: &str,
    order_by: &OrderBy,
    parent_pk: i64,
) -> Vec<T>
where
    T: DbRecord,
    F: Fn() -> T,
{
    let mut out = Vec::new();
    load_ancillary(&mut out, db, make, fk_name, order_by, parent_pk);
    out
}
