//! Persisted layout and navigation preferences.
//!
//! Expansion state has two on-disk shapes, selected by `expandedStateVersion`:
//!
//! - **v1**: `expandedFolderIds`, a flat list with no context.
//! - **v2**: `expandedStateTree`, a map from folder context key (folder id or
//!   `"__root__"`) to the folders expanded *directly* within that context.
//!
//! The field names match what earlier releases wrote, so existing stored
//! state deserializes unchanged. Migration lives in the engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{BookmarkId, FolderContext};

/// Context key → ids expanded directly within that context.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpansionTree(BTreeMap<String, Vec<BookmarkId>>);

impl ExpansionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folders expanded within `ctx`, in expansion order.
    pub fn expanded_in(&self, ctx: &FolderContext) -> &[BookmarkId] {
        self.0.get(ctx.key()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_expanded(&self, ctx: &FolderContext, id: &BookmarkId) -> bool {
        self.expanded_in(ctx).contains(id)
    }

    /// Append `id` to `ctx` unless already present. Returns true if added.
    pub fn insert(&mut self, ctx: &FolderContext, id: BookmarkId) -> bool {
        let list = self.0.entry(ctx.key().to_string()).or_default();
        if list.contains(&id) {
            return false;
        }
        list.push(id);
        true
    }

    /// Remove `id` from `ctx`. Returns true if it was present.
    pub fn remove(&mut self, ctx: &FolderContext, id: &BookmarkId) -> bool {
        match self.0.get_mut(ctx.key()) {
            Some(list) => {
                let before = list.len();
                list.retain(|x| x != id);
                before != list.len()
            }
            None => false,
        }
    }

    /// Replace the list for `ctx`.
    pub fn set(&mut self, ctx: &FolderContext, ids: Vec<BookmarkId>) {
        self.0.insert(ctx.key().to_string(), ids);
    }

    pub fn contexts(&self) -> impl Iterator<Item = FolderContext> + '_ {
        self.0.keys().map(|k| FolderContext::from_key(k))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// UI/navigation preferences, read once at mount and rewritten on each change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutState {
    #[serde(default)]
    pub pinned_ids: Vec<BookmarkId>,
    #[serde(default)]
    pub last_open_folder: Option<BookmarkId>,
    /// Always open this folder on a new tab (takes priority over `last_open_folder`).
    #[serde(default)]
    pub startup_folder_id: Option<BookmarkId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_folder_expansion: Option<bool>,
    /// v1 expansion state, kept only until migrated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_folder_ids: Option<Vec<BookmarkId>>,
    /// v2 expansion state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_state_tree: Option<ExpansionTree>,
    /// 1 = flat list, 2 = context tree. Absent means v1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_state_version: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_in_new_tab: Option<bool>,
}

impl LayoutState {
    pub fn keeps_folder_expansion(&self) -> bool {
        self.keep_folder_expansion.unwrap_or(false)
    }

    pub fn opens_in_new_tab(&self) -> bool {
        self.open_in_new_tab.unwrap_or(false)
    }

    /// Expansion schema version, treating an absent field as v1.
    pub fn expansion_version(&self) -> u8 {
        self.expanded_state_version.unwrap_or(1)
    }

    pub fn is_pinned(&self, id: &BookmarkId) -> bool {
        self.pinned_ids.contains(id)
    }
}
