//! The UI-facing session: one open new-tab view.
//!
//! [`NewTabSession`] ties the engine together for a single view: it owns the
//! loaded tree, layout preferences, the navigator, expansion state, the
//! optimistic order and the clipboard. Every operation returns either a
//! fresh [`FolderView`] or an [`ApplyResult`]; none of them return `Err`.
//!
//! Locks guarding the view are never held across an `.await`: each
//! operation copies what it needs out, awaits, then re-locks to apply.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use shiori_types::{
    ApplyResult, BookmarkAction, BookmarkChanges, BookmarkId, BookmarkNode, ClipboardItem, ClipboardOp,
    CreateDetails, FolderContext, LayoutState, SearchEngine, SearchSettings, StorageKey,
};

use crate::clipboard::Clipboard;
use crate::config::{EngineConfig, ToggleMode};
use crate::edit::{normalize_folder_title, normalize_title, normalize_url};
use crate::error::{EngineError, EngineResult};
use crate::expansion::{EXPANSION_VERSION, ExpansionState, migrate_layout};
use crate::flows::{BookmarkBus, BookmarkFlow, Subscription};
use crate::layout::{LayoutWriter, read_layout};
use crate::navigation::{
    Breadcrumb, ClickDebouncer, FolderGesture, Navigator, STARTUP_FOLDER_MISSING, heal_startup_folder,
    initial_folder,
};
use crate::reorder::{ReorderOutcome, SortableOrder, drag_to};
use crate::search::{SearchHit, search};
use crate::service::BookmarkService;
use crate::snapshot::SnapshotStore;
use crate::state::{StateStore, load_typed, save_typed};
use crate::store::BookmarkStore;
use crate::tree::{FolderEntry, TreeIndex, find_by_id, folders};

/// Everything the UI needs to draw the current folder.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderView {
    pub active_folder_id: Option<BookmarkId>,
    pub breadcrumbs: Vec<Breadcrumb>,
    /// Visible nodes in display order.
    pub nodes: Vec<BookmarkNode>,
    pub expanded_ids: Vec<BookmarkId>,
    /// Cards that cannot be dragged (expanded inline).
    pub disabled_ids: Vec<BookmarkId>,
    pub offline: bool,
    pub error_message: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pinned_ids: Vec<BookmarkId>,
    pub clipboard: Option<ClipboardItem>,
    pub open_in_new_tab: bool,
}

#[derive(Debug, Default)]
struct ViewState {
    tree: Vec<BookmarkNode>,
    updated_at: Option<DateTime<Utc>>,
    offline: bool,
    error_message: Option<String>,
    layout: LayoutState,
    navigator: Navigator,
    expansion: ExpansionState,
}

impl ViewState {
    fn current_ids(&self) -> Vec<BookmarkId> {
        self.navigator
            .current_nodes(&self.tree)
            .iter()
            .map(|n| n.id.clone())
            .collect()
    }
}

/// One open view over the bookmark engine.
pub struct NewTabSession {
    service: Arc<BookmarkService>,
    state: Arc<dyn StateStore>,
    writer: LayoutWriter,
    view: Mutex<ViewState>,
    order: SortableOrder,
    clipboard: Clipboard,
    debouncer: ClickDebouncer,
    gestures: tokio::sync::Mutex<mpsc::UnboundedReceiver<FolderGesture>>,
}

impl NewTabSession {
    /// Open a session: read the layout and pick the initial folder.
    ///
    /// The tree is not loaded yet; call [`Self::load_bookmarks`].
    pub async fn open(store: Arc<dyn BookmarkStore>, state: Arc<dyn StateStore>, config: EngineConfig) -> Self {
        let bus = BookmarkBus::new(config.bus.capacity);
        let snapshots = SnapshotStore::with_version(state.clone(), config.snapshot.version);
        let service = Arc::new(BookmarkService::new(store, snapshots, bus.clone()));
        let writer = LayoutWriter::spawn(state.clone(), bus);

        let layout = read_layout(state.as_ref()).await;
        let navigator = Navigator::new(initial_folder(&layout));
        let (debouncer, gestures) = ClickDebouncer::new(config.click_debounce());
        info!(folder = ?navigator.active(), mode = %config.navigation.toggle_mode, "session opened");

        Self {
            service,
            state,
            writer,
            view: Mutex::new(ViewState {
                layout,
                navigator,
                expansion: ExpansionState::new(config.navigation.toggle_mode),
                ..Default::default()
            }),
            order: SortableOrder::new(),
            clipboard: Clipboard::new(),
            debouncer,
            gestures: tokio::sync::Mutex::new(gestures),
        }
    }

    pub fn service(&self) -> &BookmarkService {
        &self.service
    }

    /// Subscribe to engine events (`bookmarks.*`, `layout.changed`).
    pub fn subscribe(&self, pattern: &str) -> Subscription<BookmarkFlow> {
        self.service.bus().subscribe(pattern)
    }

    /// Wait for queued layout writes to land.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }

    pub fn layout(&self) -> LayoutState {
        self.view.lock().layout.clone()
    }

    pub fn tree(&self) -> Vec<BookmarkNode> {
        self.view.lock().tree.clone()
    }

    pub fn set_toggle_mode(&self, mode: ToggleMode) {
        self.view.lock().expansion.set_mode(mode);
    }

    // ========================================================================
    // Loading and view
    // ========================================================================

    /// Load the tree (live or cached), migrate and validate layout, reseed
    /// the display order.
    pub async fn load_bookmarks(&self) -> FolderView {
        let resp = self.service.load_bookmarks().await;
        {
            let mut guard = self.view.lock();
            let v = &mut *guard;
            v.tree = resp.tree;
            v.updated_at = Some(resp.updated_at);
            v.offline = resp.from_cache;
            v.error_message = resp.error;

            let mut dirty = !v.tree.is_empty() && migrate_layout(&mut v.layout, &v.tree);
            if let Some(healed) = heal_startup_folder(&mut v.layout, &v.tree, v.navigator.active_mut()) {
                v.error_message = Some(STARTUP_FOLDER_MISSING.to_string());
                if healed.fell_back {
                    v.expansion.on_navigate(&v.layout);
                }
                dirty = true;
            }
            if dirty {
                self.writer.save(&v.layout);
            }
            self.order.seed(v.current_ids());
        }
        self.view()
    }

    /// The current view, without touching the store.
    pub fn view(&self) -> FolderView {
        let v = self.view.lock();
        let ctx = v.navigator.context();
        let expanded = v.expansion.expanded_in(&v.layout, &ctx);
        FolderView {
            active_folder_id: v.navigator.active().cloned(),
            breadcrumbs: v.navigator.breadcrumbs(&v.tree),
            nodes: in_display_order(v.navigator.current_nodes(&v.tree), &self.order.ordered_ids()),
            disabled_ids: expanded.clone(),
            expanded_ids: expanded,
            offline: v.offline,
            error_message: v.error_message.clone(),
            updated_at: v.updated_at,
            pinned_ids: v.layout.pinned_ids.clone(),
            clipboard: self.clipboard.current(),
            open_in_new_tab: v.layout.opens_in_new_tab(),
        }
    }

    pub fn folders(&self) -> Vec<FolderEntry> {
        folders(&self.view.lock().tree)
    }

    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        search(&self.view.lock().tree, query)
    }

    /// The store changed outside the engine: refresh and reload.
    pub async fn on_external_change(&self) -> FolderView {
        self.service.on_external_change().await;
        self.load_bookmarks().await
    }

    // ========================================================================
    // Navigation and expansion
    // ========================================================================

    /// Open `id`, or the top-level view for `None`.
    pub fn navigate_to_folder(&self, id: Option<BookmarkId>) -> FolderView {
        self.debouncer.cancel();
        {
            let mut guard = self.view.lock();
            let v = &mut *guard;
            v.navigator.navigate(id, &mut v.layout);
            v.expansion.on_navigate(&v.layout);
            self.writer.save(&v.layout);
            self.order.seed(v.current_ids());
        }
        self.view()
    }

    /// Double click on a folder card.
    pub fn open_subfolder(&self, id: BookmarkId) -> FolderView {
        self.navigate_to_folder(Some(id))
    }

    pub fn back_to_parent(&self) -> FolderView {
        let target = {
            let v = self.view.lock();
            if v.navigator.active().is_none() {
                None
            } else {
                Some(v.navigator.back_target(&v.tree))
            }
        };
        match target {
            Some(target) => self.navigate_to_folder(target),
            None => self.view(),
        }
    }

    /// Expand or collapse `id` within `context` (default: the current view).
    pub fn toggle_folder(&self, id: BookmarkId, context: Option<FolderContext>) -> FolderView {
        {
            let mut guard = self.view.lock();
            let v = &mut *guard;
            let ctx = context.unwrap_or_else(|| v.navigator.context());
            let toggled = v.expansion.toggle(&mut v.layout, &id, &ctx);
            if toggled.persist {
                self.writer.save(&v.layout);
            }
        }
        self.view()
    }

    /// Single click on a folder card: toggles after the debounce delay
    /// unless a double click or navigation cancels it first.
    pub fn folder_toggle_gesture(&self, id: BookmarkId) {
        let context = self.view.lock().navigator.context();
        self.debouncer.schedule(FolderGesture { id, context });
    }

    pub fn cancel_gesture(&self) {
        self.debouncer.cancel();
    }

    /// Wait for the next debounced click and apply it.
    pub async fn next_gesture(&self) -> Option<FolderView> {
        let gesture = self.gestures.lock().await.recv().await?;
        Some(self.toggle_folder(gesture.id, Some(gesture.context)))
    }

    // ========================================================================
    // Reordering
    // ========================================================================

    /// Show `next_ids` as the folder's order and write it back.
    pub async fn reorder(&self, next_ids: Vec<BookmarkId>) -> ReorderOutcome {
        let (parent, offline) = {
            let v = self.view.lock();
            (v.navigator.parent_for_view(&v.tree), v.offline)
        };
        let outcome = self
            .order
            .handle_reorder(next_ids, parent.as_ref(), offline, self.service.as_ref())
            .await;
        match &outcome {
            ReorderOutcome::Applied => {
                self.load_bookmarks().await;
            }
            ReorderOutcome::Rejected(e) | ReorderOutcome::RolledBack(e) => {
                self.view.lock().error_message = Some(e.clone());
            }
            ReorderOutcome::Superseded => {}
        }
        outcome
    }

    /// Drop `dragged` onto the slot held by `over`.
    ///
    /// Folders expanded inline in this view cannot be dragged.
    pub async fn move_card(&self, dragged: &BookmarkId, over: &BookmarkId) -> ReorderOutcome {
        let expanded = {
            let v = self.view.lock();
            v.expansion.expanded_in(&v.layout, &v.navigator.context())
        };
        if expanded.contains(dragged) {
            return ReorderOutcome::Rejected(format!("{dragged} is expanded; collapse it to move it"));
        }
        let next = drag_to(&self.order.ordered_ids(), dragged, over);
        self.reorder(next).await
    }

    // ========================================================================
    // Clipboard
    // ========================================================================

    pub fn cut(&self, id: &BookmarkId) -> ApplyResult {
        self.capture(id, ClipboardOp::Cut).into()
    }

    pub fn copy(&self, id: &BookmarkId) -> ApplyResult {
        self.capture(id, ClipboardOp::Copy).into()
    }

    fn capture(&self, id: &BookmarkId, op: ClipboardOp) -> EngineResult<()> {
        let v = self.view.lock();
        let node = find_by_id(&v.tree, Some(id)).ok_or_else(|| EngineError::NotFound(id.clone()))?;
        let parent = TreeIndex::build(&v.tree)
            .parent_of(id)
            .cloned()
            .unwrap_or_else(BookmarkId::root);
        let title = node.display_title().to_string();
        match op {
            ClipboardOp::Cut => self.clipboard.cut(id, title, node.kind(), parent),
            ClipboardOp::Copy => self.clipboard.copy(id, title, node.kind(), parent),
        }
        Ok(())
    }

    pub fn clipboard(&self) -> Option<ClipboardItem> {
        self.clipboard.current()
    }

    pub fn clear_clipboard(&self) {
        self.clipboard.clear();
    }

    /// Paste the clipboard into `target_parent` at `index`.
    pub async fn paste(&self, target_parent: &BookmarkId, index: Option<usize>) -> ApplyResult {
        match self.clipboard.paste(&self.service, target_parent, index).await {
            Ok(_) => {
                self.load_bookmarks().await;
                ApplyResult::ok()
            }
            Err(e) => {
                warn!(target = %target_parent, error = %e, "paste failed");
                if !e.is_policy() {
                    // A partial copy may have landed.
                    self.load_bookmarks().await;
                }
                e.into()
            }
        }
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Rename a folder, or retitle and re-point a bookmark.
    pub async fn edit(&self, id: &BookmarkId, title: &str, url: Option<&str>) -> ApplyResult {
        let action = self.node_is_folder(id).and_then(|is_folder| {
            let url = match (is_folder, url) {
                (false, Some(url)) => Some(normalize_url(url)?),
                _ => None,
            };
            Ok(BookmarkAction::Update {
                id: id.clone(),
                changes: BookmarkChanges {
                    title: Some(normalize_title(title)),
                    url,
                },
            })
        });
        self.mutate(action).await
    }

    /// Delete a bookmark. Folders are refused.
    pub async fn delete(&self, id: &BookmarkId) -> ApplyResult {
        let action = self.node_is_folder(id).and_then(|is_folder| {
            if is_folder {
                return Err(EngineError::FolderDeleteForbidden(id.clone()));
            }
            Ok(BookmarkAction::Remove {
                id: id.clone(),
                recursive: false,
            })
        });
        self.mutate(action).await
    }

    pub async fn create_folder(&self, parent_id: &BookmarkId, title: &str, index: Option<usize>) -> ApplyResult {
        let details = CreateDetails::folder(parent_id, normalize_folder_title(title)).at(index);
        self.mutate(Ok(BookmarkAction::Create(details))).await
    }

    pub async fn create_bookmark(
        &self,
        parent_id: &BookmarkId,
        title: &str,
        url: &str,
        index: Option<usize>,
    ) -> ApplyResult {
        let action = normalize_url(url).map(|url| {
            BookmarkAction::Create(CreateDetails::bookmark(parent_id, normalize_title(title), url).at(index))
        });
        self.mutate(action).await
    }

    fn node_is_folder(&self, id: &BookmarkId) -> EngineResult<bool> {
        let v = self.view.lock();
        find_by_id(&v.tree, Some(id))
            .map(BookmarkNode::is_folder)
            .ok_or_else(|| EngineError::NotFound(id.clone()))
    }

    async fn mutate(&self, action: EngineResult<BookmarkAction>) -> ApplyResult {
        let action = match action {
            Ok(action) => action,
            Err(e) => return e.into(),
        };
        let verb = action.verb();
        match self.service.execute(action).await {
            Ok(_) => {
                self.load_bookmarks().await;
                ApplyResult::ok()
            }
            Err(e) => {
                warn!(action = verb, error = %e, "bookmark change failed");
                e.into()
            }
        }
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    /// Make `id` the startup folder and open it, or clear it if it already is.
    pub fn toggle_startup_folder(&self, id: BookmarkId) -> FolderView {
        let was_startup = {
            let mut v = self.view.lock();
            let was = v.layout.startup_folder_id.as_ref() == Some(&id);
            v.layout.startup_folder_id = if was { None } else { Some(id.clone()) };
            if was {
                self.writer.save(&v.layout);
            }
            was
        };
        if was_startup {
            self.view()
        } else {
            self.navigate_to_folder(Some(id))
        }
    }

    /// Pin or unpin `id`. Returns true if it is now pinned.
    pub fn toggle_pin(&self, id: BookmarkId) -> bool {
        let mut v = self.view.lock();
        let pinned = match v.layout.pinned_ids.iter().position(|p| p == &id) {
            Some(pos) => {
                v.layout.pinned_ids.remove(pos);
                false
            }
            None => {
                v.layout.pinned_ids.push(id);
                true
            }
        };
        self.writer.save(&v.layout);
        pinned
    }

    pub fn set_keep_folder_expansion(&self, keep: bool) -> FolderView {
        {
            let mut v = self.view.lock();
            v.layout.keep_folder_expansion = Some(keep);
            if keep {
                v.layout.expanded_state_version = Some(EXPANSION_VERSION);
            } else {
                v.expansion.reset();
            }
            self.writer.save(&v.layout);
        }
        self.view()
    }

    pub fn set_open_in_new_tab(&self, open: bool) {
        let mut v = self.view.lock();
        v.layout.open_in_new_tab = Some(open);
        self.writer.save(&v.layout);
    }

    pub async fn search_settings(&self) -> SearchSettings {
        match load_typed::<SearchSettings>(self.state.as_ref(), StorageKey::SearchSettings).await {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "search settings unreadable, using defaults");
                SearchSettings::default()
            }
        }
    }

    pub async fn set_search_engine(&self, engine: SearchEngine) -> ApplyResult {
        let settings = SearchSettings { default_engine: engine };
        save_typed(self.state.as_ref(), StorageKey::SearchSettings, &settings)
            .await
            .map_err(EngineError::from)
            .into()
    }

    /// Forget layout, search and background settings. The snapshot stays.
    pub async fn reset_settings(&self) -> ApplyResult {
        self.debouncer.cancel();
        self.writer.flush().await;
        for key in StorageKey::settings_keys() {
            if let Err(e) = self.state.remove(key).await {
                warn!(key = %key, error = %e, "reset failed");
                return EngineError::from(e).into();
            }
        }
        {
            let mut v = self.view.lock();
            v.layout = LayoutState::default();
            v.expansion.reset();
            *v.navigator.active_mut() = None;
            self.order.seed(v.current_ids());
        }
        self.service.bus().publish(BookmarkFlow::LayoutChanged);
        info!("settings reset");
        ApplyResult::ok()
    }
}

/// `nodes` arranged by `ordered` first, then any node `ordered` lacks.
fn in_display_order(nodes: &[BookmarkNode], ordered: &[BookmarkId]) -> Vec<BookmarkNode> {
    let mut placed = vec![false; nodes.len()];
    let mut out = Vec::with_capacity(nodes.len());
    for id in ordered {
        if let Some(i) = nodes.iter().position(|n| &n.id == id) {
            if !placed[i] {
                placed[i] = true;
                out.push(nodes[i].clone());
            }
        }
    }
    out.extend(
        nodes
            .iter()
            .zip(placed)
            .filter(|(_, placed)| !placed)
            .map(|(n, _)| n.clone()),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_order_puts_unknown_nodes_last() {
        let nodes = vec![
            BookmarkNode::bookmark("2", "B", "https://x"),
            BookmarkNode::bookmark("3", "C", "https://y"),
            BookmarkNode::bookmark("4", "D", "https://z"),
        ];
        let ordered: Vec<BookmarkId> = vec!["3".into(), "9".into(), "2".into(), "3".into()];
        let ids: Vec<_> = in_display_order(&nodes, &ordered)
            .into_iter()
            .map(|n| n.id.into_inner())
            .collect();
        assert_eq!(ids, ["3", "2", "4"]);
    }
}
