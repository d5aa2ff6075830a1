//! Error types for factories and the factory registry

use fabricate_template::TemplateError;
use thiserror::Error;

/// Result type for factory operations
pub type Result<T> = std::result::Result<T, FactoryError>;

/// Errors that can occur while creating records
#[derive(Debug, Error)]
pub enum FactoryError {
    /// A factory was constructed without a sink to create records in
    #[error("the provided service doesn't appear to exist")]
    ServiceNotDefined,

    /// No factory is registered under the requested name
    #[error("could not locate factory '{name}'. Did you define it?")]
    FactoryNotDefined { name: String },

    /// Resolving the data or params template failed
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// The sink rejected the record
    #[error("failed to create record: {source}")]
    Create {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FactoryError {
    /// Wrap an error returned by a sink
    pub fn create(error: anyhow::Error) -> Self {
        Self::Create {
            source: error.into(),
        }
    }
}
