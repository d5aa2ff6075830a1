//! Resolution context: the per-pass engine behind [`Template::resolve`].
//!
//! A context owns the memoization cache for one resolution pass. Every field
//! gets a [`Shared`] future that is inserted into the cache under the context
//! lock before anything is awaited, so concurrent requests for the same field
//! join a single invocation instead of racing to start two. A caller that
//! stops waiting leaves the invocation to the others; it is never restarted.
//!
//! Generators receive a [`Context`] handle tagged with the field they compute.
//! While a handle awaits another field the context records a wait edge; a
//! request that would close a loop of edges fails with
//! [`TemplateError::CyclicDependency`] instead of waiting forever.
//!
//! [`Template::resolve`]: crate::Template::resolve

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::iter;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{try_join_all, BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{Result, TemplateError};
use crate::field::Field;
use crate::path::FieldPath;
use crate::schema::Schema;
use crate::Record;

type FieldFuture = Shared<BoxFuture<'static, Result<Value>>>;

/// Handle to a resolution pass.
///
/// Cheap to clone. Passed to every generator so it can look up sibling
/// fields with [`get`](Context::get) or recompute them with
/// [`call`](Context::call).
#[derive(Clone)]
pub struct Context {
    state: Arc<ContextState>,
    /// Field whose generator this handle was issued to
    field: Option<Arc<str>>,
    /// Held by root handles only
    root: Option<Arc<RootGuard>>,
}

struct ContextState {
    schema: Arc<Schema>,
    /// Fields whose `call` created this context, outermost first
    lineage: Vec<String>,
    inner: Mutex<ContextInner>,
}

#[derive(Default)]
struct ContextInner {
    cache: HashMap<String, FieldFuture>,
    /// waiting field -> awaited field -> number of pending awaits
    waits: HashMap<String, HashMap<String, usize>>,
}

impl ContextState {
    fn lock(&self) -> MutexGuard<'_, ContextInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ContextInner {
    fn add_wait(&mut self, from: &str, to: &str) {
        *self
            .waits
            .entry(from.to_string())
            .or_default()
            .entry(to.to_string())
            .or_default() += 1;
    }

    fn remove_wait(&mut self, from: &str, to: &str) {
        let Some(targets) = self.waits.get_mut(from) else {
            return;
        };
        if let Some(count) = targets.get_mut(to) {
            *count -= 1;
            if *count == 0 {
                targets.remove(to);
            }
        }
        if targets.is_empty() {
            self.waits.remove(from);
        }
    }

    /// Chain of wait edges leading from `start` to `target`, both included.
    fn wait_path(&self, start: &str, target: &str) -> Option<Vec<String>> {
        let mut stack = vec![vec![start.to_string()]];
        let mut seen = HashSet::new();
        while let Some(path) = stack.pop() {
            let last = path.last()?;
            if last == target {
                return Some(path);
            }
            if !seen.insert(last.clone()) {
                continue;
            }
            if let Some(next) = self.waits.get(last) {
                for awaited in next.keys() {
                    let mut extended = path.clone();
                    extended.push(awaited.clone());
                    stack.push(extended);
                }
            }
        }
        None
    }
}

/// Removes a wait edge once the await it describes is over, cancelled or not.
struct WaitGuard {
    state: Arc<ContextState>,
    from: Arc<str>,
    to: String,
}

impl Drop for WaitGuard {
    fn drop(&mut self) {
        self.state.lock().remove_wait(&self.from, &self.to);
    }
}

/// In-flight field futures hold generator handles, and so the context itself.
/// Once the last root handle is gone nobody can await them any more; dropping
/// the cache cancels them and releases the context.
struct RootGuard {
    state: Arc<ContextState>,
}

impl Drop for RootGuard {
    fn drop(&mut self) {
        let cache = std::mem::take(&mut self.state.lock().cache);
        drop(cache);
    }
}

impl Context {
    /// Create a root context over a schema.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self::with_lineage(schema.into(), Vec::new())
    }

    fn with_lineage(schema: Arc<Schema>, lineage: Vec<String>) -> Self {
        let state = Arc::new(ContextState {
            schema,
            lineage,
            inner: Mutex::new(ContextInner::default()),
        });
        Self {
            root: Some(Arc::new(RootGuard {
                state: Arc::clone(&state),
            })),
            state,
            field: None,
        }
    }

    /// The schema this context resolves.
    pub fn schema(&self) -> &Schema {
        &self.state.schema
    }

    /// Name of the field this handle was issued to, `None` for a root handle.
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    fn for_field(&self, key: &str) -> Self {
        Self {
            state: Arc::clone(&self.state),
            field: Some(Arc::from(key)),
            root: None,
        }
    }

    /// Resolve a field, or a dotted path into a resolved field.
    ///
    /// The field's generator runs at most once for the lifetime of this
    /// context; every later request, including nested paths below it, sees
    /// the same value. A schema key that literally contains dots is matched
    /// before the path is split.
    pub async fn get(&self, path: &str) -> Result<Value> {
        let path = if self.state.schema.contains_key(path) {
            FieldPath::exact(path)
        } else {
            FieldPath::parse(path)?
        };
        let value = self.resolve_key(path.key()).await?;
        path.descend(value)
    }

    /// Resolve a field in a brand new context over the same schema.
    ///
    /// Nothing is shared with this context: the field's generator and every
    /// generator it depends on run again.
    pub async fn call(&self, path: &str) -> Result<Value> {
        let mut lineage = self.state.lineage.clone();
        lineage.extend(self.field().map(str::to_string));
        debug!(path, caller = ?self.field(), "resolving field in a fresh context");
        Context::with_lineage(Arc::clone(&self.state.schema), lineage)
            .get(path)
            .await
    }

    /// Resolve every field of the schema concurrently.
    ///
    /// Fails with the first field error; fields that already started keep
    /// their side effects.
    pub async fn resolve_all(&self) -> Result<Record> {
        let keys: Vec<&str> = self.state.schema.keys().collect();
        debug!(fields = keys.len(), "resolving all fields");
        let values = try_join_all(keys.iter().map(|key| self.resolve_key(key))).await?;
        Ok(keys.into_iter().map(str::to_string).zip(values).collect())
    }

    async fn resolve_key(&self, key: &str) -> Result<Value> {
        let field = self
            .state
            .schema
            .get(key)
            .ok_or_else(|| TemplateError::not_defined(key))?;
        let (future, _wait) = self.enter(key, field)?;
        future.await
    }

    /// Register interest in `key`: reject cycles, record the wait edge and
    /// fetch (or start) the field's invocation, all under one lock.
    fn enter(&self, key: &str, field: &Field) -> Result<(FieldFuture, Option<WaitGuard>)> {
        let mut inner = self.state.lock();
        if let Some(chain) = self.cycle(&inner, key) {
            warn!(field = key, chain = %chain.join(" -> "), "cyclic field dependency");
            return Err(TemplateError::CyclicDependency {
                key: key.to_string(),
                chain,
            });
        }
        let wait = self.field.as_ref().map(|from| {
            inner.add_wait(from, key);
            WaitGuard {
                state: Arc::clone(&self.state),
                from: Arc::clone(from),
                to: key.to_string(),
            }
        });
        let future = match inner.cache.get(key) {
            Some(future) => {
                trace!(field = key, "memoized field");
                future.clone()
            }
            None => {
                let future = self.invoke(key, field.clone()).shared();
                inner.cache.insert(key.to_string(), future.clone());
                future
            }
        };
        Ok((future, wait))
    }

    fn cycle(&self, inner: &ContextInner, key: &str) -> Option<Vec<String>> {
        if self.state.lineage.iter().any(|ancestor| ancestor == key) {
            let mut chain = self.state.lineage.clone();
            chain.extend(self.field().map(str::to_string));
            chain.push(key.to_string());
            return Some(chain);
        }
        let from = self.field()?;
        if from == key {
            return Some(vec![from.to_string(), key.to_string()]);
        }
        inner
            .wait_path(key, from)
            .map(|path| iter::once(from.to_string()).chain(path).collect())
    }

    fn invoke(&self, key: &str, mut field: Field) -> BoxFuture<'static, Result<Value>> {
        let handle = self.for_field(key);
        let key = key.to_string();
        async move {
            loop {
                debug!(field = %key, kind = %field.kind(), "resolving field");
                field = match field {
                    Field::Value(value) => return Ok(value),
                    Field::Deferred(deferred) => {
                        return deferred
                            .settle()
                            .await
                            .map_err(|source| TemplateError::FieldResolve { key, source });
                    }
                    Field::Generator(generator) => generator(handle.clone())
                        .await
                        .map_err(|err| TemplateError::from_generator(&key, err))?,
                };
            }
        }
        .boxed()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached: Vec<String> = self.state.lock().cache.keys().cloned().collect();
        f.debug_struct("Context")
            .field("field", &self.field)
            .field("lineage", &self.state.lineage)
            .field("cached", &cached)
            .finish()
    }
}
