//! The bookmark store capability.
//!
//! This is the browser's bookmark API as the engine consumes it. The engine
//! never implements these semantics itself; it calls them, and treats every
//! read as potentially stale because the user can edit bookmarks in the
//! browser at any time.

use async_trait::async_trait;

use shiori_types::{BookmarkChanges, BookmarkId, BookmarkNode, CreateDetails, MoveDestination};

use super::StoreResult;

/// Remote bookmark store operations.
///
/// Every call is a suspension point. Implementations must be safe to share
/// across tasks.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    // ========================================================================
    // Reading
    // ========================================================================

    /// The whole tree: a one-element list holding the synthetic root.
    async fn get_tree(&self) -> StoreResult<Vec<BookmarkNode>>;

    /// Direct children of `parent_id`, in store order, without grandchildren.
    async fn get_children(&self, parent_id: &BookmarkId) -> StoreResult<Vec<BookmarkNode>>;

    /// The subtree rooted at `id`, as a one-element list.
    async fn get_sub_tree(&self, id: &BookmarkId) -> StoreResult<Vec<BookmarkNode>>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Create a folder (no url) or bookmark. Returns the created node.
    async fn create(&self, details: CreateDetails) -> StoreResult<BookmarkNode>;

    /// Move `id` under `destination.parent_id` at `destination.index`
    /// (appended when absent). Indices past the end are clamped.
    async fn move_node(&self, id: &BookmarkId, destination: MoveDestination) -> StoreResult<()>;

    /// Remove a bookmark or an empty folder.
    async fn remove(&self, id: &BookmarkId) -> StoreResult<()>;

    /// Remove a folder and everything under it.
    async fn remove_tree(&self, id: &BookmarkId) -> StoreResult<()>;

    /// Change title and/or url.
    async fn update(&self, id: &BookmarkId, changes: BookmarkChanges) -> StoreResult<()>;
}
