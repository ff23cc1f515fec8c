//! Ingestion error types

use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Source configuration rejected
    #[error("invalid source config '{field}': {message}")]
    InvalidConfig {
        /// Offending field
        field: &'static str,
        /// Error message
        message: String,
    },
}

impl IngestionError {
    pub(crate) fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
