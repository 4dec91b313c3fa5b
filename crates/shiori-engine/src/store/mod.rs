//! External bookmark store abstraction.
//!
//! - [`BookmarkStore`] - the capability the engine calls (getTree, move, ...)
//! - [`MemoryStore`] - in-process store with browser-like semantics
//! - [`JsonFileStore`] - [`MemoryStore`] persisted to a JSON file
//!
//! ## Semantics shared by the backends
//!
//! - Ids are assigned by the store, as increasing decimal strings.
//! - The synthetic root `"0"` cannot be moved, removed or edited, and only
//!   holds the default containers.
//! - `move_node` detaches first, then inserts at the clamped index. Applied
//!   in ascending target position, a sequence of moves converges to the
//!   target order in one pass.

mod error;
mod json_file;
mod memory;
mod ops;

pub use error::{StoreError, StoreResult};
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use ops::BookmarkStore;
