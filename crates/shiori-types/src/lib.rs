//! Shared types for shiori, the bookmark-tree consistency engine.
//!
//! This crate is the leaf of the workspace: the bookmark tree as the browser
//! store hands it to us, the persisted layout state, the cached snapshot, and
//! the request/response shapes that cross the engine boundary. It has **no
//! internal shiori dependencies**.
//!
//! # Ownership
//!
//! ```text
//! Browser bookmark store (source of truth)
//!     └── BookmarkNode tree, synthetic root "0"
//!           └── cached as BookmarkSnapshot (offline fallback)
//!
//! LayoutState (persisted UI preferences)
//!     └── pinned ids, startup/last folder
//!     └── expansion state, keyed by FolderContext
//!
//! ClipboardItem (in memory only, at most one)
//! ```
//!
//! # Key Types
//!
//! |---------------------|---------------------------------------------|
//! | Type                | Purpose                                     |
//! |---------------------|---------------------------------------------|
//! | [`BookmarkId`]      | Opaque store-assigned node id               |
//! | [`FolderContext`]   | Parent folder or root sentinel              |
//! | [`BookmarkNode`]    | Folder or bookmark, with children           |
//! | [`BookmarkSnapshot`]| Timestamped cached copy of the tree         |
//! | [`LayoutState`]     | Persisted navigation preferences            |
//! | [`ClipboardItem`]   | Pending cut/copy                            |
//! | [`BookmarkAction`]  | One remote mutation                         |
//! | [`ApplyResult`]     | `{success, error}` returned to the UI       |
//! |---------------------|---------------------------------------------|

pub mod action;
pub mod clipboard;
pub mod ids;
pub mod layout;
pub mod node;
pub mod settings;
pub mod snapshot;

pub use action::{ApplyResult, BookmarkAction, BookmarkChanges, CreateDetails, LoadResponse, MoveDestination};
pub use clipboard::{ClipboardItem, ClipboardOp, ItemKind};
pub use ids::{BookmarkId, FolderContext, ROOT_CONTEXT_KEY, ROOT_ID};
pub use layout::{ExpansionTree, LayoutState};
pub use node::{BookmarkNode, UNTITLED};
pub use settings::{SearchEngine, SearchSettings, StorageKey};
pub use snapshot::{BookmarkSnapshot, SNAPSHOT_VERSION};
