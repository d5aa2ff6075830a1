//! Dotted field paths, e.g. `address.street` or `items.0.price`.

use serde_json::Value;
use tracing::trace;

use crate::error::{Result, TemplateError};

/// A parsed field path: the top-level schema key plus the segments that
/// index into its resolved value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath<'a> {
    raw: &'a str,
    key: &'a str,
    segments: Vec<&'a str>,
}

impl<'a> FieldPath<'a> {
    /// Split a path on dots. Empty segments (`a..b`, `.a`) are rejected.
    pub fn parse(raw: &'a str) -> Result<Self> {
        let mut parts = raw.split('.');
        let key = parts.next().unwrap_or_default();
        let segments: Vec<&str> = parts.collect();
        if key.is_empty() || segments.iter().any(|segment| segment.is_empty()) {
            return Err(TemplateError::not_defined(raw));
        }
        Ok(Self { raw, key, segments })
    }

    /// A path that addresses a schema key verbatim, dots included.
    pub fn exact(raw: &'a str) -> Self {
        Self {
            raw,
            key: raw,
            segments: Vec::new(),
        }
    }

    pub fn key(&self) -> &'a str {
        self.key
    }

    pub fn is_nested(&self) -> bool {
        !self.segments.is_empty()
    }

    /// Walk the remaining segments through an already resolved value.
    ///
    /// Objects are indexed by key and arrays by decimal index. Anything else
    /// means the path does not exist.
    pub fn descend(&self, value: Value) -> Result<Value> {
        let mut current = value;
        for segment in &self.segments {
            trace!(path = self.raw, segment, "descending into resolved field");
            current = match current {
                Value::Object(mut map) => map.remove(*segment),
                Value::Array(mut items) => segment
                    .parse::<usize>()
                    .ok()
                    .filter(|index| *index < items.len())
                    .map(|index| items.swap_remove(index)),
                _ => None,
            }
            .ok_or_else(|| TemplateError::not_defined(self.raw))?;
        }
        Ok(current)
    }
}
