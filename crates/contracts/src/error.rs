//! Layered error definitions
//!
//! Categorized by source: config / data server / io

use thiserror::Error;

use crate::StreamKind;

/// Configuration and IO error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Data server contract errors
///
/// Exhaustion is not an error; these only signal a misused `take_*` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataServerError {
    /// `take_*` called for a stream that is not next in time order
    #[error("contract violation: took {requested} while next stream is {next}")]
    ContractViolation {
        requested: StreamKind,
        next: StreamKind,
    },

    /// `take_*` called for a stream with nothing pending
    #[error("contract violation: stream {kind} has no pending measurement")]
    StreamEmpty { kind: StreamKind },

    /// `take_*` called before `next_kind` confirmed every stream
    #[error("contract violation: took {requested} before the next stream was known")]
    NotReady { requested: StreamKind },
}

impl DataServerError {
    /// Create contract violation error
    pub fn contract_violation(requested: StreamKind, next: StreamKind) -> Self {
        Self::ContractViolation { requested, next }
    }

    /// Stream the failed call asked for
    pub fn requested(&self) -> StreamKind {
        match self {
            Self::ContractViolation { requested, .. } => *requested,
            Self::StreamEmpty { kind } => *kind,
            Self::NotReady { requested } => *requested,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_violation_message() {
        let e = DataServerError::contract_violation(StreamKind::Attitude, StreamKind::Image);
        assert_eq!(
            e.to_string(),
            "contract violation: took attitude while next stream is image"
        );
        assert_eq!(e.requested(), StreamKind::Attitude);

        let e = DataServerError::NotReady {
            requested: StreamKind::Imu,
        };
        assert_eq!(e.requested(), StreamKind::Imu);
    }

    #[test]
    fn test_config_validation_message() {
        let e = ContractError::config_validation("queues.imu", "must be >= 1");
        assert!(e.to_string().contains("queues.imu"));
    }
}
