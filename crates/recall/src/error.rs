//! Error types for Recall

use thiserror::Error;

use crate::memory::types::MemoryId;

/// Main error type for Recall operations
#[derive(Error, Debug)]
pub enum RecallError {
    /// Memory id missing, or owned by another tenant (indistinguishable on purpose)
    #[error("Memory not found: {0}")]
    NotFound(MemoryId),

    /// Malformed argument (empty query, out-of-range importance, bad filter, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Reserved: no defined operation currently triggers this
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store/index inconsistency detected; surfaced, never silently recovered
    #[error("Internal error: {0}")]
    Internal(String),

    /// Embedding generation errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server/transport errors
    #[error("Server error: {0}")]
    Server(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RecallError {
    /// JSON-RPC error code for this error
    pub fn code(&self) -> i64 {
        match self {
            RecallError::NotFound(_) => -32001,
            RecallError::InvalidArgument(_) => -32602,
            RecallError::Conflict(_) => -32005,
            _ => -32000,
        }
    }
}

/// Result type alias for Recall operations
pub type Result<T> = std::result::Result<T, RecallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(RecallError::NotFound(42).code(), -32001);
        assert_eq!(
            RecallError::InvalidArgument("bad".to_string()).code(),
            -32602
        );
        assert_eq!(RecallError::Conflict("reserved".to_string()).code(), -32005);
        assert_eq!(RecallError::Internal("oops".to_string()).code(), -32000);
        assert_eq!(RecallError::Embedding("oops".to_string()).code(), -32000);
    }

    #[test]
    fn test_not_found_message_does_not_leak_tenant() {
        let message = RecallError::NotFound(7).to_string();
        assert_eq!(message, "Memory not found: 7");
    }
}
