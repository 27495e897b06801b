//! Error types for quality-based routing and feedback aggregation
//!
//! Every failure is surfaced to the caller synchronously. Collaborator errors
//! are tagged with the storage operation that produced them and otherwise
//! passed through unchanged. Nothing in this crate retries.

use thiserror::Error;

/// Main error type for routing and feedback operations
#[derive(Debug, Error)]
pub enum QualityError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Operation '{operation}' timed out after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Store error in '{operation}': {message}")]
    Store { operation: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl QualityError {
    /// Create validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create invalid argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create timeout error for a collaborator operation
    pub fn timeout<S: Into<String>>(operation: S, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create store error tagged with the failing operation
    pub fn store<O: Into<String>, S: Into<String>>(operation: O, message: S) -> Self {
        Self::Store {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Storage operation a timeout or store failure originated from
    pub fn operation(&self) -> Option<&str> {
        match self {
            QualityError::Timeout { operation, .. } | QualityError::Store { operation, .. } => {
                Some(operation)
            }
            _ => None,
        }
    }

    /// Whether a caller could reasonably retry the same call.
    ///
    /// Malformed input never becomes valid on retry. Appends are not
    /// idempotent, so callers retrying a timed-out `record_feedback` may
    /// double-record.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QualityError::Timeout { .. } | QualityError::Store { .. }
        )
    }
}

/// Result type for quality operations
pub type QualityResult<T> = Result<T, QualityError>;
