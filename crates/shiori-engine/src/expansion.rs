//! Folder expansion state.
//!
//! Which folders are expanded inline is tracked per [`FolderContext`]: the
//! list under a context holds only the folders expanded *directly* in it,
//! never the full closure. Collapsing a folder leaves the state of its
//! descendants alone, so it comes back when the folder is re-expanded.
//!
//! ```text
//!   v1 (flat list)  ──migrate_layout──▶  v2 (context → ids)
//!        ▲                                    │
//!        └──── read from older releases       └── toggle / persist
//! ```
//!
//! Expansion is persisted only while `keepFolderExpansion` is on. Otherwise
//! it lives in [`ExpansionState`]'s transient tree and is dropped whenever
//! the user navigates to another folder.

use tracing::{debug, info};

use shiori_types::{BookmarkId, BookmarkNode, ExpansionTree, FolderContext, LayoutState};

use crate::config::ToggleMode;
use crate::tree::TreeIndex;

/// Current expansion schema version.
pub const EXPANSION_VERSION: u8 = 2;

/// Rebuild a v1 flat list as a v2 context tree.
///
/// Each id lands under the context of its parent in `index`. Ids no longer
/// in the tree, and the synthetic root itself, are dropped. Duplicates
/// collapse to one entry, keeping first-seen order.
pub fn migrate_v1(legacy: &[BookmarkId], index: &TreeIndex) -> ExpansionTree {
    let mut tree = ExpansionTree::new();
    for id in legacy {
        match index.parent_of(id) {
            Some(parent) => {
                tree.insert(&FolderContext::from_parent(parent), id.clone());
            }
            None => debug!(id = %id, "dropping legacy expanded id with no parent"),
        }
    }
    tree
}

/// Bring `layout` to the current expansion schema in place.
///
/// Returns true if anything changed (and the layout should be persisted).
/// State that is already v2 is left untouched.
pub fn migrate_layout(layout: &mut LayoutState, tree: &[BookmarkNode]) -> bool {
    if layout.expansion_version() >= EXPANSION_VERSION {
        return false;
    }

    let legacy = layout.expanded_folder_ids.take().unwrap_or_default();
    let migrated = migrate_v1(&legacy, &TreeIndex::build(tree));
    let target = layout.expanded_state_tree.get_or_insert_with(ExpansionTree::new);
    for ctx in migrated.contexts().collect::<Vec<_>>() {
        for id in migrated.expanded_in(&ctx) {
            target.insert(&ctx, id.clone());
        }
    }
    layout.expanded_state_version = Some(EXPANSION_VERSION);
    info!(legacy = legacy.len(), "migrated expansion state to v2");
    true
}

/// Flip `id` within `ctx`. Returns true if it is now expanded.
pub fn toggle_in(tree: &mut ExpansionTree, id: &BookmarkId, ctx: &FolderContext, mode: ToggleMode) -> bool {
    if tree.remove(ctx, id) {
        return false;
    }
    if mode == ToggleMode::Accordion {
        tree.set(ctx, Vec::new());
    }
    tree.insert(ctx, id.clone());
    true
}

/// Result of a toggle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Toggled {
    pub expanded: bool,
    /// The layout changed and should be written back.
    pub persist: bool,
}

/// Expansion bookkeeping for one view.
#[derive(Debug, Default)]
pub struct ExpansionState {
    mode: ToggleMode,
    transient: ExpansionTree,
}

impl ExpansionState {
    pub fn new(mode: ToggleMode) -> Self {
        Self {
            mode,
            transient: ExpansionTree::new(),
        }
    }

    pub fn set_mode(&mut self, mode: ToggleMode) {
        self.mode = mode;
    }

    /// Toggle `id` in `ctx`, in the layout when expansion is kept, in the
    /// transient tree otherwise.
    pub fn toggle(&mut self, layout: &mut LayoutState, id: &BookmarkId, ctx: &FolderContext) -> Toggled {
        if layout.keeps_folder_expansion() {
            let tree = layout.expanded_state_tree.get_or_insert_with(ExpansionTree::new);
            let expanded = toggle_in(tree, id, ctx, self.mode);
            layout.expanded_state_version = Some(EXPANSION_VERSION);
            Toggled { expanded, persist: true }
        } else {
            let expanded = toggle_in(&mut self.transient, id, ctx, self.mode);
            Toggled { expanded, persist: false }
        }
    }

    /// Folders expanded directly in `ctx`.
    pub fn expanded_in(&self, layout: &LayoutState, ctx: &FolderContext) -> Vec<BookmarkId> {
        let tree = if layout.keeps_folder_expansion() {
            match layout.expanded_state_tree.as_ref() {
                Some(tree) => tree,
                None => return Vec::new(),
            }
        } else {
            &self.transient
        };
        tree.expanded_in(ctx).to_vec()
    }

    /// Navigation drops transient expansion.
    pub fn on_navigate(&mut self, layout: &LayoutState) {
        if !layout.keeps_folder_expansion() {
            self.transient.clear();
        }
    }

    /// Forget transient expansion unconditionally.
    pub fn reset(&mut self) {
        self.transient.clear();
    }
}
