//! Record factories: resolve a data template and a params template, then
//! hand both to a sink

use std::fmt;
use std::sync::Arc;

use fabricate_template::{Record, Schema, Template};
use futures::future::try_join_all;
use serde_json::Value;
use tracing::debug;

use crate::error::{FactoryError, Result};
use crate::sink::Sink;

/// A data template and a params template bound to a [`Sink`].
///
/// The two templates resolve in separate contexts: data fields cannot see
/// params fields and the other way round.
#[derive(Clone)]
pub struct Factory {
    sink: Arc<dyn Sink>,
    data: Template,
    params: Template,
}

impl Factory {
    pub fn new(sink: Arc<dyn Sink>, data: impl Into<Template>) -> Self {
        Self {
            sink,
            data: data.into(),
            params: Template::default(),
        }
    }

    /// Like [`new`](Factory::new), for callers that may not have a sink.
    pub fn try_new(sink: Option<Arc<dyn Sink>>, data: impl Into<Template>) -> Result<Self> {
        let sink = sink.ok_or(FactoryError::ServiceNotDefined)?;
        Ok(Self::new(sink, data))
    }

    /// Replace the params template.
    pub fn with_params(mut self, params: impl Into<Template>) -> Self {
        self.params = params.into();
        self
    }

    pub fn template(&self) -> &Template {
        &self.data
    }

    pub fn params_template(&self) -> &Template {
        &self.params
    }

    /// Resolve data and params, then create one record in the sink.
    pub async fn create(&self, data: Schema, params: Schema) -> Result<Value> {
        let data = self.data.resolve(data).await?;
        let params = self.params.resolve(params).await?;
        self.forward(data, params).await
    }

    /// Create `quantity` records concurrently.
    ///
    /// Results come back in creation order. The first failure fails the
    /// whole batch; records the sink already accepted stay created.
    pub async fn create_many(
        &self,
        quantity: usize,
        data: Schema,
        params: Schema,
    ) -> Result<Vec<Value>> {
        debug!(quantity, "creating records");
        try_join_all((0..quantity).map(|_| self.create(data.clone(), params.clone()))).await
    }

    /// A new factory over the extended templates, bound to the same sink.
    pub fn extend(&self, data: Schema, params: Schema) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            data: self.data.extend(data),
            params: self.params.extend(params),
        }
    }

    /// Resolve the data template without creating anything.
    pub async fn resolve(&self, data: Schema) -> Result<Record> {
        Ok(self.data.resolve(data).await?)
    }

    async fn forward(&self, data: Record, params: Record) -> Result<Value> {
        debug!(fields = data.len(), params = params.len(), "creating record");
        self.sink
            .create(data, params)
            .await
            .map_err(FactoryError::create)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("data", &self.data)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use fabricate_template::{Context, Field};
    use serde_json::json;

    #[tokio::test]
    async fn test_create_stores_resolved_record() {
        let sink = MemorySink::new();
        let factory = Factory::new(
            Arc::new(sink.clone()),
            Schema::new().field("name", "Ada").field(
                "greeting",
                Field::generator(|ctx: Context| async move {
                    let name = ctx.get("name").await?;
                    Ok(format!("hello {}", name.as_str().unwrap_or_default()))
                }),
            ),
        );

        let created = factory.create(Schema::new(), Schema::new()).await.unwrap();
        assert_eq!(created["greeting"], json!("hello Ada"));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.create_count(), 1);
    }

    #[test]
    fn test_try_new_without_sink() {
        let err = Factory::try_new(None, Schema::new()).unwrap_err();
        assert!(matches!(err, FactoryError::ServiceNotDefined));
    }

    #[tokio::test]
    async fn test_resolve_does_not_create() {
        let sink = MemorySink::new();
        let factory = Factory::new(Arc::new(sink.clone()), Schema::new().field("n", 1));

        let resolved = factory.resolve(Schema::new().field("n", 2)).await.unwrap();
        assert_eq!(resolved["n"], json!(2));
        assert!(sink.is_empty());
        assert_eq!(sink.create_count(), 0);
    }

    #[tokio::test]
    async fn test_extend_keeps_template_and_sink() {
        let sink = MemorySink::new();
        let base = Factory::new(Arc::new(sink.clone()), Schema::new().field("role", "user"));
        let admin = base.extend(Schema::new().field("role", "admin"), Schema::new());

        admin.create(Schema::new(), Schema::new()).await.unwrap();
        base.create(Schema::new(), Schema::new()).await.unwrap();

        let mut roles: Vec<Value> = sink
            .ids()
            .iter()
            .filter_map(|id| sink.get(id))
            .map(|record| record["role"].clone())
            .collect();
        roles.sort_by_key(|role| role.to_string());
        assert_eq!(roles, vec![json!("admin"), json!("user")]);
        assert_eq!(base.template().schema().len(), 1);
    }
}
