//! Persisted state error types.

use std::io;
use thiserror::Error;

/// Failure reading or writing persisted state.
#[derive(Debug, Error)]
pub enum StateError {
    /// I/O error from a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored value has the wrong shape.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl StateError {
    /// Create an Other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Persisted state result type.
pub type StateResult<T> = Result<T, StateError>;
