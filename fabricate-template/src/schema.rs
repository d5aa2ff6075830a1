//! Ordered map of field names to field values

use std::fmt;

use indexmap::IndexMap;

use crate::field::Field;
use crate::Record;

/// A template schema.
///
/// Insertion order has no influence on resolution, but it is the order fields
/// appear in a resolved [`Record`].
#[derive(Clone, Default)]
pub struct Schema {
    fields: IndexMap<String, Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn field(mut self, name: impl Into<String>, field: impl Into<Field>) -> Self {
        self.insert(name, field);
        self
    }

    /// Insert or replace a field. A replaced field keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, field: impl Into<Field>) -> Option<Field> {
        self.fields.insert(name.into(), field.into())
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Layer `overrides` on top of this schema.
    ///
    /// Overriding entries replace the base entry entirely, whatever either
    /// side's kind is. Entries new to the base are appended in override order.
    pub fn merge(&self, overrides: &Schema) -> Schema {
        let mut merged = self.clone();
        for (name, field) in &overrides.fields {
            merged.fields.insert(name.clone(), field.clone());
        }
        merged
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

impl<K, F> FromIterator<(K, F)> for Schema
where
    K: Into<String>,
    F: Into<Field>,
{
    fn from_iter<I: IntoIterator<Item = (K, F)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, field)| (name.into(), field.into()))
                .collect(),
        }
    }
}

/// Every entry of a plain record becomes a constant field.
impl From<Record> for Schema {
    fn from(record: Record) -> Self {
        record.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = (&'a String, &'a Field);
    type IntoIter = indexmap::map::Iter<'a, String, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}
