//! Destinations for resolved records

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use fabricate_template::Record;
use serde_json::Value;
use tracing::trace;
use ulid::Ulid;

/// Something that persists a resolved record.
///
/// A [`Factory`](crate::Factory) calls [`create`](Sink::create) exactly once
/// per record and returns whatever the sink returns. The factory never looks
/// at the sink beyond that call.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Persist `data`, using `params` for anything that is not part of the
    /// record itself (a tenant, a transaction handle, a flag).
    async fn create(&self, data: Record, params: Record) -> anyhow::Result<Value>;
}

/// A sink that keeps records in memory, keyed by their id field.
///
/// Records without an id get a fresh ULID; an id that is present must be a
/// string. Clones share the same storage.
#[derive(Debug, Clone)]
pub struct MemorySink {
    id_field: Arc<str>,
    records: Arc<DashMap<String, Record>>,
    creates: Arc<AtomicUsize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::with_id_field("id")
    }

    pub fn with_id_field(id_field: impl Into<Arc<str>>) -> Self {
        Self {
            id_field: id_field.into(),
            records: Arc::new(DashMap::new()),
            creates: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn get(&self, id: &str) -> Option<Record> {
        self.records.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids of every stored record, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.records.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// How many times [`Sink::create`] has been called.
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    fn record_id(&self, data: &mut Record) -> anyhow::Result<String> {
        match data.get(self.id_field.as_ref()) {
            Some(Value::String(id)) => Ok(id.clone()),
            Some(Value::Null) | None => {
                let id = Ulid::new().to_string();
                data.insert(self.id_field.to_string(), Value::String(id.clone()));
                Ok(id)
            }
            Some(other) => anyhow::bail!("{} must be a string, got {}", self.id_field, other),
        }
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn create(&self, mut data: Record, _params: Record) -> anyhow::Result<Value> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let id = self.record_id(&mut data)?;
        if self.records.contains_key(&id) {
            anyhow::bail!("a record with {} '{}' already exists", self.id_field, id);
        }
        trace!(id = %id, "storing record");
        self.records.insert(id, data.clone());
        Ok(Value::Object(data))
    }
}
