//! Field values: what a schema entry may hold.
//!
//! Every entry is explicitly tagged: a constant, a deferred computation that
//! settles once, or a generator that is handed the resolution [`Context`].
//! Nothing is classified by inspecting the value at runtime.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt, Shared};
use serde_json::Value;

use crate::context::Context;
use crate::error::FieldCause;
use crate::schema::Schema;
use crate::template::Template;
use crate::Record;

/// Future returned by a generator.
pub type GeneratorFuture = BoxFuture<'static, anyhow::Result<Field>>;

/// A field computation. Receives the context handle of the resolution pass
/// it runs in.
pub type Generator = Arc<dyn Fn(Context) -> GeneratorFuture + Send + Sync>;

/// A single schema entry.
#[derive(Clone)]
pub enum Field {
    /// A constant value
    Value(Value),
    /// A computation already handed over; settles at most once
    Deferred(Deferred),
    /// A function invoked once per resolution context
    Generator(Generator),
}

/// Discriminant of a [`Field`], recorded when a field is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Value,
    Deferred,
    Generator,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => write!(f, "value"),
            Self::Deferred => write!(f, "deferred"),
            Self::Generator => write!(f, "generator"),
        }
    }
}

impl Field {
    /// A constant field.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// An async generator with access to sibling fields.
    ///
    /// ```rust
    /// use fabricate_template::{Field, Schema};
    ///
    /// let schema = Schema::new()
    ///     .field("firstName", "John")
    ///     .field("lastName", "Doe")
    ///     .field(
    ///         "fullName",
    ///         Field::generator(|ctx| async move {
    ///             let first = ctx.get("firstName").await?;
    ///             let last = ctx.get("lastName").await?;
    ///             Ok(format!("{} {}", first.as_str().unwrap_or_default(), last.as_str().unwrap_or_default()))
    ///         }),
    ///     );
    /// assert_eq!(schema.len(), 3);
    /// ```
    pub fn generator<F, Fut, T>(f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Into<Field>,
    {
        Self::Generator(Arc::new(move |ctx: Context| -> GeneratorFuture {
            f(ctx)
                .map(|result| result.map(<T as Into<Field>>::into))
                .boxed()
        }))
    }

    /// A synchronous generator that needs no context, e.g. a random id.
    pub fn compute<F, T>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<Field>,
    {
        Self::Generator(Arc::new(move |_: Context| -> GeneratorFuture {
            future::ready(Ok(f().into())).boxed()
        }))
    }

    /// A deferred field backed by the given future.
    pub fn deferred<Fut, T>(fut: Fut) -> Self
    where
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Into<Value>,
    {
        Self::Deferred(Deferred::new(fut))
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Value(_) => FieldKind::Value,
            Self::Deferred(_) => FieldKind::Deferred,
            Self::Generator(_) => FieldKind::Generator,
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Deferred(deferred) => f.debug_tuple("Deferred").field(deferred).finish(),
            Self::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// A value in flight.
///
/// The wrapped future is driven by whoever is awaiting it; a caller that gives
/// up leaves it for the next one. Every clone shares the outcome, so a
/// deferred field used by several templates or resolution passes is awaited
/// exactly once.
#[derive(Clone)]
pub struct Deferred {
    future: Shared<BoxFuture<'static, Result<Value, FieldCause>>>,
}

impl Deferred {
    pub fn new<Fut, T>(fut: Fut) -> Self
    where
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Into<Value>,
    {
        Self {
            future: fut
                .map(|result| result.map(<T as Into<Value>>::into).map_err(into_cause))
                .boxed()
                .shared(),
        }
    }

    /// Whether the outcome is already known.
    pub fn is_settled(&self) -> bool {
        self.future.peek().is_some()
    }

    /// Await the underlying future (once) and return its outcome.
    pub async fn settle(&self) -> Result<Value, FieldCause> {
        self.future.clone().await
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.future.peek() {
            Some(Ok(value)) => write!(f, "Settled({value})"),
            Some(Err(err)) => write!(f, "Failed({err})"),
            None => f.write_str("Pending"),
        }
    }
}

fn into_cause(error: anyhow::Error) -> FieldCause {
    Arc::from(Box::<dyn std::error::Error + Send + Sync>::from(error))
}

impl From<Value> for Field {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Record> for Field {
    fn from(record: Record) -> Self {
        Self::Value(Value::Object(record))
    }
}

impl From<Vec<Value>> for Field {
    fn from(values: Vec<Value>) -> Self {
        Self::Value(Value::Array(values))
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<Deferred> for Field {
    fn from(deferred: Deferred) -> Self {
        Self::Deferred(deferred)
    }
}

/// A nested template resolves in a context of its own and yields its record.
impl From<Template> for Field {
    fn from(template: Template) -> Self {
        Self::generator(move |_| {
            let template = template.clone();
            async move { Ok(Value::Object(template.resolve(Schema::new()).await?)) }
        })
    }
}

macro_rules! field_from_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Field {
                fn from(value: $ty) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )*
    };
}

field_from_primitive!(String, bool, i32, i64, u32, u64, usize, f32, f64);
