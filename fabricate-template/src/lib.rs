//! Lazy, memoizing field templates
//!
//! `fabricate-template` turns a declarative map of named fields into a
//! resolved record. A field is a constant, a deferred value, or a generator
//! that may look up sibling fields by name (or by dotted path into a resolved
//! sibling) without caring about declaration order.
//!
//! # Architecture
//!
//! - **Explicit fields**: [`Field`] tags every entry; nothing is guessed from
//!   the runtime shape of a value
//! - **One pass, one cache**: each [`Template::resolve`] builds a fresh
//!   [`Context`]; within it every generator runs at most once
//! - **Fresh on demand**: [`Context::call`] recomputes a field in a new context
//! - **Fail fast**: the first failing field fails the whole resolution; cycles
//!   are reported as [`TemplateError::CyclicDependency`]
//!
//! # Example
//!
//! ```rust
//! use fabricate_template::{Context, Field, Schema, Template};
//! use serde_json::json;
//!
//! # async fn example() -> fabricate_template::Result<()> {
//! let template = Template::new(
//!     Schema::new()
//!         .field("firstName", Field::compute(|| "John"))
//!         .field("lastName", Field::compute(|| "Doe"))
//!         .field(
//!             "fullName",
//!             Field::generator(|ctx: Context| async move {
//!                 let first = ctx.get("firstName").await?;
//!                 let last = ctx.get("lastName").await?;
//!                 Ok(format!("{} {}", first.as_str().unwrap_or_default(), last.as_str().unwrap_or_default()))
//!             }),
//!         ),
//! );
//!
//! let person = template.resolve(Schema::new()).await?;
//! assert_eq!(person["fullName"], json!("John Doe"));
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod error;
pub mod field;
pub mod path;
pub mod schema;
pub mod template;

pub use context::Context;
pub use error::{Result, TemplateError};
pub use field::{Deferred, Field, FieldKind, Generator, GeneratorFuture};
pub use path::FieldPath;
pub use schema::Schema;
pub use template::Template;

pub use serde_json::Value;

/// A fully resolved set of fields, in schema order.
pub type Record = serde_json::Map<String, Value>;
