//! Engine error types.
//!
//! [`EngineError`] covers policy violations and wraps the store/state
//! failures underneath them. It never reaches the UI as an `Err`: the
//! session converts every failure into an [`ApplyResult`].

use thiserror::Error;

use shiori_types::{ApplyResult, BookmarkId};

use crate::state::StateError;
use crate::store::StoreError;

/// Errors from engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Paste with nothing on the clipboard.
    #[error("clipboard is empty")]
    ClipboardEmpty,

    /// Folder pasted into itself or one of its descendants.
    #[error("cannot paste folder {0} into itself or one of its subfolders")]
    PasteCycle(BookmarkId),

    /// Delete is only permitted on bookmarks.
    #[error("folders cannot be deleted here: {0}")]
    FolderDeleteForbidden(BookmarkId),

    /// Mutation attempted while showing the cached snapshot.
    #[error("bookmarks are offline; changes cannot be saved")]
    Offline,

    /// The folder being reordered could not be determined.
    #[error("missing parent id")]
    UnknownParent,

    /// Referenced node is not in the tree.
    #[error("bookmark not found: {0}")]
    NotFound(BookmarkId),

    /// Bookmark url is blank or not an absolute url.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// A step of a multi-call batch failed; earlier steps stay applied.
    #[error("step {step} ({id}) failed: {source}")]
    BatchStep {
        step: usize,
        id: BookmarkId,
        #[source]
        source: StoreError,
    },

    /// Bookmark store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Persisted state failure.
    #[error(transparent)]
    State(#[from] StateError),
}

impl EngineError {
    /// Create a BatchStep error.
    pub fn batch_step(step: usize, id: impl Into<BookmarkId>, source: StoreError) -> Self {
        Self::BatchStep {
            step,
            id: id.into(),
            source,
        }
    }

    /// True for rejections made before any remote call.
    pub fn is_policy(&self) -> bool {
        matches!(
            self,
            Self::ClipboardEmpty
                | Self::PasteCycle(_)
                | Self::FolderDeleteForbidden(_)
                | Self::Offline
                | Self::UnknownParent
                | Self::InvalidUrl(_)
        )
    }
}

impl From<EngineError> for ApplyResult {
    fn from(e: EngineError) -> Self {
        ApplyResult::failed(e.to_string())
    }
}

/// Engine result type.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_step_message_names_step() {
        let err = EngineError::batch_step(2, "7", StoreError::other("boom"));
        assert_eq!(err.to_string(), "step 2 (7) failed: boom");
        assert!(!err.is_policy());
    }

    #[test]
    fn test_into_apply_result() {
        let result: ApplyResult = EngineError::ClipboardEmpty.into();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("clipboard is empty"));
    }
}
