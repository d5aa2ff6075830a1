//! Error types for template resolution

use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Shared, type-erased cause of a failed field.
pub type FieldCause = Arc<dyn StdError + Send + Sync>;

/// Errors that can occur while resolving template fields
///
/// Cloneable because a memoized field outcome is handed to every caller
/// that awaited it, failures included.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    /// The requested field (or a segment of its path) does not exist
    #[error("field '{key}' is not defined")]
    FieldNotDefined { key: String },

    /// A generator or deferred value failed
    #[error("failed to resolve '{key}' field: {source}")]
    FieldResolve {
        key: String,
        #[source]
        source: FieldCause,
    },

    /// A field ended up waiting on itself
    #[error("cyclic dependency while resolving '{key}': {}", chain.join(" -> "))]
    CyclicDependency { key: String, chain: Vec<String> },
}

impl TemplateError {
    /// Create a `FieldNotDefined` error for the given key or path
    pub fn not_defined(key: impl Into<String>) -> Self {
        Self::FieldNotDefined { key: key.into() }
    }

    /// Convert a generator failure into a template error.
    ///
    /// Failures that already are template errors (typically a dependency
    /// that failed first) pass through unchanged so the failing field
    /// stays named.
    pub fn from_generator(key: &str, error: anyhow::Error) -> Self {
        match error.downcast::<TemplateError>() {
            Ok(err) => err,
            Err(error) => Self::FieldResolve {
                key: key.to_string(),
                source: Arc::from(Box::<dyn StdError + Send + Sync>::from(error)),
            },
        }
    }

    /// The field key this error is about
    pub fn key(&self) -> &str {
        match self {
            Self::FieldNotDefined { key }
            | Self::FieldResolve { key, .. }
            | Self::CyclicDependency { key, .. } => key,
        }
    }
}
