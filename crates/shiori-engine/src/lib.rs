//! # shiori-engine
//!
//! Bookmark tree engine behind the shiori new-tab page.
//!
//! The engine keeps a local view of the browser's bookmark tree in sync with
//! the authoritative store, and owns everything the UI does to it:
//! - Loads the tree live, falling back to the last snapshot when offline
//! - Applies remote mutations and broadcasts a change event after each
//! - Reorders a folder optimistically, rolling back on failure and ignoring
//!   results superseded by a newer reorder
//! - Cuts, copies and pastes bookmarks and whole folders, refusing cycles
//! - Navigates folders, tracks per-context expansion, heals a stale
//!   startup folder
//!
//! ```text
//!  NewTabSession ──► BookmarkService ──► BookmarkStore (browser / file / memory)
//!       │                  │
//!       │                  ├──► SnapshotStore ──► StateStore
//!       │                  └──► BookmarkBus (bookmarks.changed, bookmarks.snapshot)
//!       └──► LayoutWriter ──► StateStore (layout_state)  ──► layout.changed
//! ```

pub mod clipboard;
pub mod config;
pub mod edit;
pub mod error;
pub mod expansion;
pub mod flows;
pub mod layout;
pub mod navigation;
pub mod reorder;
pub mod search;
pub mod service;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod tree;

pub use clipboard::{Clipboard, Pasted};
pub use config::{ConfigError, EngineConfig, ToggleMode};
pub use error::{EngineError, EngineResult};
pub use expansion::{EXPANSION_VERSION, ExpansionState, migrate_layout};
pub use flows::{
    BookmarkBus, BookmarkFlow, ChangeReason, FlowBus, FlowMessage, HasSubject, Subscription, matches_pattern,
};
pub use layout::{LayoutWriter, read_layout};
pub use navigation::{Breadcrumb, ClickDebouncer, FolderGesture, Navigator, STARTUP_FOLDER_MISSING};
pub use reorder::{ReorderOutcome, Reorderer, SortableOrder};
pub use search::{MAX_RESULTS, MatchKind, SearchHit, search};
pub use service::BookmarkService;
pub use session::{FolderView, NewTabSession};
pub use snapshot::SnapshotStore;
pub use state::{FileStateStore, MemoryStateStore, StateError, StateResult, StateStore};
pub use store::{BookmarkStore, JsonFileStore, MemoryStore, StoreError, StoreResult};
pub use tree::{FolderEntry, TreeIndex};
