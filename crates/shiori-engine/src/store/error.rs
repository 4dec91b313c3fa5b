//! Bookmark store error types.

use std::io;
use thiserror::Error;

/// Failure reported by the external bookmark store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Node id not found.
    #[error("bookmark not found: {0}")]
    NotFound(String),

    /// Destination is missing or is not a folder.
    #[error("invalid parent: {0}")]
    InvalidParent(String),

    /// The store refused the operation (e.g. modifying the root).
    #[error("operation rejected: {0}")]
    Rejected(String),

    /// Store unreachable; callers fall back to the snapshot.
    #[error("bookmark store unavailable: {0}")]
    Unavailable(String),

    /// I/O error from a file-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Stored tree could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Create a NotFound error.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Create an InvalidParent error.
    pub fn invalid_parent(id: impl Into<String>) -> Self {
        Self::InvalidParent(id.into())
    }

    /// Create a Rejected error.
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Create an Unavailable error.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create an Other error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Bookmark store result type.
pub type StoreResult<T> = Result<T, StoreError>;
