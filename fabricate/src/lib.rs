//! Record factories built on `fabricate-template`
//!
//! A [`Factory`] pairs a data [`Template`] with a params template and a
//! [`Sink`]. Each [`Factory::create`] resolves both templates in separate
//! contexts and forwards the two records to the sink once.
//! [`FactoryRegistry`] keeps factories by name.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use fabricate::{Factory, FactoryRegistry, MemorySink, Schema};
//! use serde_json::json;
//!
//! # async fn example() -> fabricate::Result<()> {
//! let users = MemorySink::new();
//! let registry = FactoryRegistry::new();
//! registry.define(
//!     "user",
//!     Factory::new(Arc::new(users.clone()), Schema::new().field("role", "member")),
//! );
//!
//! let admin = registry
//!     .create("user", Schema::new().field("role", "admin"), Schema::new())
//!     .await?;
//! assert_eq!(admin["role"], json!("admin"));
//! assert_eq!(users.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod factory;
pub mod registry;
pub mod sink;

pub use error::{FactoryError, Result};
pub use factory::Factory;
pub use registry::FactoryRegistry;
pub use sink::{MemorySink, Sink};

pub use fabricate_template::{
    Context, Deferred, Field, Record, Schema, Template, TemplateError, Value,
};
