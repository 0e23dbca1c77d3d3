//! Ordered field registry owned by one record.

use std::collections::HashMap;

use crate::field::Field;

/// Ordered mapping of field name to [`Field`].
///
/// Declaration order is preserved and determines column order in generated
/// SQL. Lookups by an undeclared name are programmer errors and panic.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    table: String,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
}

impl Schema {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Table this schema describes.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Declares a field.
    ///
    /// # Panics
    ///
    /// Panics if a field with the same name is already declared.
    pub fn add(&mut self, field: Field) {
        if self.index.contains_key(field.name()) {
            panic!(
                "Field '{}' already declared in table '{}'",
                field.name(),
                self.table
            );
        }
        self.index.insert(field.name().to_string(), self.fields.len());
        self.fields.push(field);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn try_get(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    /// # Panics
    ///
    /// Panics if `name` is not declared.
    pub fn get(&self, name: &str) -> &Field {
        match self.index.get(name) {
            Some(&i) => &self.fields[i],
            None => self.undeclared(name),
        }
    }

    /// # Panics
    ///
    /// Panics if `name` is not declared.
    pub fn get_mut(&mut self, name: &str) -> &mut Field {
        let i = match self.index.get(name) {
            Some(&i) => i,
            None => self.undeclared(name),
        };
        &mut self.fields[i]
    }

    /// Fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.fields.iter_mut()
    }

    /// Field names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn undeclared(&self, name: &str) -> ! {
        panic!("Field '{}' not declared in table '{}'", name, self.table)
    }
}
