//! Immutable, reusable field templates

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::context::Context;
use crate::error::Result;
use crate::schema::Schema;
use crate::Record;

/// A schema plus the operations to resolve and extend it.
///
/// Templates never change after construction. [`extend`](Template::extend)
/// returns a new template; the receiver is left as it was.
#[derive(Debug, Clone, Default)]
pub struct Template {
    schema: Arc<Schema>,
}

impl Template {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// A fresh root context over this template's schema.
    pub fn context(&self) -> Context {
        Context::new(Arc::clone(&self.schema))
    }

    /// Resolve every field, with `overrides` layered over the schema.
    ///
    /// Overrides replace base fields outright and resolve in the same context
    /// as the remaining fields, so a generator asking for an overridden
    /// sibling sees the override.
    pub async fn resolve(&self, overrides: Schema) -> Result<Record> {
        let schema = if overrides.is_empty() {
            Arc::clone(&self.schema)
        } else {
            Arc::new(self.schema.merge(&overrides))
        };
        debug!(
            fields = schema.len(),
            overrides = overrides.len(),
            "resolving template"
        );
        Context::new(schema).resolve_all().await
    }

    /// A new template whose schema is this one with `overrides` layered on top.
    pub fn extend(&self, overrides: Schema) -> Template {
        Self::new(self.schema.merge(&overrides))
    }

    /// Resolve a single field (or path) in a throwaway context.
    ///
    /// Each call runs in its own context, so the value is not the one a full
    /// [`resolve`](Template::resolve) would produce for interdependent fields.
    pub async fn resolve_field(&self, path: &str) -> Result<Value> {
        self.context().call(path).await
    }
}

impl From<Schema> for Template {
    fn from(schema: Schema) -> Self {
        Self::new(schema)
    }
}
