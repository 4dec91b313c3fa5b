//! Bookmark identifiers and folder contexts.
//!
//! Ids are assigned by the browser store and are opaque to us: we never parse
//! them, only compare them. The synthetic tree root is conventionally `"0"`.
//!
//! A [`FolderContext`] names *where* an expansion decision was made: inside a
//! folder view, or at the top-level view. On disk the top-level view is the
//! `"__root__"` sentinel key.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Id of the synthetic root node returned by `getTree()`.
pub const ROOT_ID: &str = "0";

/// Persisted key for the top-level view in `expandedStateTree`.
pub const ROOT_CONTEXT_KEY: &str = "__root__";

/// A store-assigned bookmark or folder id.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkId(String);

impl BookmarkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The synthetic root id.
    pub fn root() -> Self {
        Self(ROOT_ID.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BookmarkId({})", self.0)
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl Borrow<str> for BookmarkId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BookmarkId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BookmarkId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BookmarkId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&BookmarkId> for BookmarkId {
    fn from(id: &BookmarkId) -> Self {
        id.clone()
    }
}

impl PartialEq<str> for BookmarkId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for BookmarkId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ── Folder context ──────────────────────────────────────────────────────────

/// The view under which a set of directly-expanded folders is tracked.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum FolderContext {
    /// The top-level view (no active folder).
    Root,
    /// Inside the given folder.
    Folder(BookmarkId),
}

impl FolderContext {
    /// Context for an optional active folder; `None` is the top-level view.
    pub fn from_active(active: Option<&BookmarkId>) -> Self {
        match active {
            Some(id) => Self::Folder(id.clone()),
            None => Self::Root,
        }
    }

    /// Context a node lives in, given its parent id.
    ///
    /// Children of the synthetic root are shown at the top-level view, so
    /// their context is [`FolderContext::Root`].
    pub fn from_parent(parent: &BookmarkId) -> Self {
        if parent.is_root() {
            Self::Root
        } else {
            Self::Folder(parent.clone())
        }
    }

    /// Key used in the persisted `expandedStateTree` map.
    pub fn key(&self) -> &str {
        match self {
            Self::Root => ROOT_CONTEXT_KEY,
            Self::Folder(id) => id.as_str(),
        }
    }

    /// Inverse of [`FolderContext::key`].
    pub fn from_key(key: &str) -> Self {
        if key == ROOT_CONTEXT_KEY {
            Self::Root
        } else {
            Self::Folder(BookmarkId::new(key))
        }
    }

    /// The folder id, if this is not the root context.
    pub fn folder_id(&self) -> Option<&BookmarkId> {
        match self {
            Self::Root => None,
            Self::Folder(id) => Some(id),
        }
    }
}

impl fmt::Display for FolderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookmark_id_serde_is_transparent() {
        let id = BookmarkId::new("42");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
        let back: BookmarkId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_context_key_round_trip() {
        assert_eq!(FolderContext::Root.key(), "__root__");
        assert_eq!(FolderContext::from_key("__root__"), FolderContext::Root);
        assert_eq!(
            FolderContext::from_key("17"),
            FolderContext::Folder(BookmarkId::new("17"))
        );
    }

    #[test]
    fn test_children_of_synthetic_root_live_in_root_context() {
        assert_eq!(FolderContext::from_parent(&BookmarkId::root()), FolderContext::Root);
        assert_eq!(
            FolderContext::from_parent(&BookmarkId::new("1")),
            FolderContext::Folder(BookmarkId::new("1"))
        );
    }
}
