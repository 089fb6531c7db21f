//! Error handling for Remix
//!
//! Every error surfaces immediately to the caller. Nothing is retried
//! internally; a failed remote fetch simply leaves its field unset.

use thiserror::Error;

/// Result type alias for Remix operations
pub type Result<T> = std::result::Result<T, RemixError>;

/// Main error type for Remix operations
#[derive(Error, Debug)]
pub enum RemixError {
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    // Remote analysis API
    #[error("Remote analysis error during {operation}: {message}")]
    RemoteError { operation: String, message: String },

    // Buffer errors
    #[error("Audio buffer has no backing data")]
    UninitializedBuffer,

    #[error("Sample index {index} out of range for buffer of {len} frames")]
    IndexError { index: usize, len: usize },

    #[error("Capacity exceeded: cannot write {requested} frames at {cursor} into buffer of {capacity}")]
    CapacityExceeded {
        cursor: usize,
        requested: usize,
        capacity: usize,
    },

    #[error("Cannot decode audio: {reason}")]
    DecodeError {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RemixError {
    pub(crate) fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        RemixError::RemoteError {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        RemixError::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        RemixError::DecodeError {
            reason: reason.into(),
            source: None,
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            RemixError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            RemixError::RemoteError { .. } => "REMOTE_ERROR",
            RemixError::UninitializedBuffer => "UNINITIALIZED_BUFFER",
            RemixError::IndexError { .. } => "INDEX_ERROR",
            RemixError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            RemixError::DecodeError { .. } => "DECODE_ERROR",
            RemixError::Io(_) => "IO_ERROR",
            RemixError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if retrying the operation (or re-encoding the input) can succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RemixError::RemoteError { .. } | RemixError::DecodeError { .. }
        )
    }
}
