//! Named factories

use std::sync::Arc;

use dashmap::DashMap;
use fabricate_template::{Record, Schema};
use once_cell::sync::Lazy;
use serde_json::Value;
use tracing::debug;

use crate::error::{FactoryError, Result};
use crate::factory::Factory;

static GLOBAL: Lazy<FactoryRegistry> = Lazy::new(FactoryRegistry::new);

/// A name-to-factory map.
///
/// Registries are plain values: create one and pass it to whatever needs it.
/// Clones share the same entries. [`FactoryRegistry::global`] exists for
/// callers that want a single process-wide instance.
#[derive(Debug, Clone, Default)]
pub struct FactoryRegistry {
    factories: Arc<DashMap<String, Factory>>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> &'static FactoryRegistry {
        &GLOBAL
    }

    /// Register `factory` under `name`, returning the factory it replaced.
    pub fn define(&self, name: impl Into<String>, factory: Factory) -> Option<Factory> {
        let name = name.into();
        debug!(name = %name, "defining factory");
        self.factories.insert(name, factory)
    }

    pub fn factory(&self, name: &str) -> Result<Factory> {
        self.factories
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| FactoryError::FactoryNotDefined {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn remove(&self, name: &str) -> Option<Factory> {
        self.factories.remove(name).map(|(_, factory)| factory)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub async fn create(&self, name: &str, data: Schema, params: Schema) -> Result<Value> {
        self.factory(name)?.create(data, params).await
    }

    pub async fn create_many(
        &self,
        quantity: usize,
        name: &str,
        data: Schema,
        params: Schema,
    ) -> Result<Vec<Value>> {
        self.factory(name)?
            .create_many(quantity, data, params)
            .await
    }

    /// Resolve the named factory's data template without creating anything.
    pub async fn get(&self, name: &str, data: Schema) -> Result<Record> {
        self.factory(name)?.resolve(data).await
    }
}
