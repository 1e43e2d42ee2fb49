//! Ordered collection of named fields.

use crate::field::Field;
use indexmap::IndexMap;
use std::rc::Rc;

/// Fields keyed by name in declaration order.
///
/// Order drives both generation order and output key order. Replacing a
/// field keeps the position of the original.
#[derive(Debug, Default)]
pub struct FieldSet {
    fields: IndexMap<String, Rc<Field>>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `name`; returns the field it replaced.
    pub fn insert(&mut self, name: impl Into<String>, field: Field) -> Option<Rc<Field>> {
        self.fields.insert(name.into(), Rc::new(field))
    }

    pub fn get(&self, name: &str) -> Option<Rc<Field>> {
        self.fields.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<Field>)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Owned copy of the entries, so callers can generate without holding a borrow.
    pub fn snapshot(&self) -> Vec<(String, Rc<Field>)> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), Rc::clone(field)))
            .collect()
    }
}
