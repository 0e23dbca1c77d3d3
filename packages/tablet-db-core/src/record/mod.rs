//! Record base: schema-driven load/save/delete of one row.

mod object;
pub(crate) mod sql;

pub use object::{DatabaseObject, ObjectOptions};

/// Anything backed by a [`DatabaseObject`].
///
/// Concrete record types (tasks, ancillary rows, stored variables) implement
/// this to reach the generic engine.
pub trait DbRecord {
    fn object(&self) -> &DatabaseObject;
    fn object_mut(&mut self) -> &mut DatabaseObject;
}

impl DbRecord for DatabaseObject {
    fn object(&self) -> &DatabaseObject {
        self
    }

    fn object_mut(&mut self) -> &mut DatabaseObject {
        self
    }
}
