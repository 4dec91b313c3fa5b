//! Navigation: which folder is open, how we got there, and how to get back.
//!
//! The active folder is `None` for the top-level view. At mount the startup
//! folder wins over the last opened one. After every tree load the startup
//! folder is re-validated and cleared if it no longer exists.

use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use shiori_types::{BookmarkId, BookmarkNode, FolderContext, LayoutState};

use crate::tree::{self, find_by_id, find_path, top_level_nodes};

/// Warning surfaced when the startup folder has disappeared.
pub const STARTUP_FOLDER_MISSING: &str = "startup folder no longer exists; the setting was cleared";

/// Folder to open at mount.
pub fn initial_folder(layout: &LayoutState) -> Option<BookmarkId> {
    layout
        .startup_folder_id
        .clone()
        .or_else(|| layout.last_open_folder.clone())
}

/// What [`heal_startup_folder`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartupHealed {
    pub cleared: BookmarkId,
    /// The view was showing the missing folder and went back to the top.
    pub fell_back: bool,
}

/// Drop a startup folder that no longer resolves in `tree`.
///
/// An empty tree proves nothing (store unreachable, no snapshot), so it
/// never clears anything.
pub fn heal_startup_folder(
    layout: &mut LayoutState,
    tree: &[BookmarkNode],
    active: &mut Option<BookmarkId>,
) -> Option<StartupHealed> {
    if tree.is_empty() {
        return None;
    }
    let startup = layout.startup_folder_id.as_ref()?;
    if find_by_id(top_level_nodes(tree), Some(startup)).is_some() {
        return None;
    }

    let cleared = layout.startup_folder_id.take()?;
    let fell_back = active.as_ref() == Some(&cleared);
    if fell_back {
        *active = None;
    }
    warn!(id = %cleared, fell_back, "startup folder is gone, clearing it");
    Some(StartupHealed { cleared, fell_back })
}

/// One breadcrumb segment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub id: BookmarkId,
    pub title: String,
}

/// Current-folder state for one view.
#[derive(Debug, Default)]
pub struct Navigator {
    active: Option<BookmarkId>,
}

impl Navigator {
    pub fn new(active: Option<BookmarkId>) -> Self {
        Self { active }
    }

    pub fn active(&self) -> Option<&BookmarkId> {
        self.active.as_ref()
    }

    pub fn active_mut(&mut self) -> &mut Option<BookmarkId> {
        &mut self.active
    }

    pub fn context(&self) -> FolderContext {
        FolderContext::from_active(self.active.as_ref())
    }

    /// Open `id` (`None` = top level) and record it as the last open folder.
    pub fn navigate(&mut self, id: Option<BookmarkId>, layout: &mut LayoutState) {
        debug!(folder = ?id, "navigate");
        layout.last_open_folder = id.clone();
        self.active = id;
    }

    /// The open folder's node, if it still exists.
    pub fn current_folder<'a>(&self, tree: &'a [BookmarkNode]) -> Option<&'a BookmarkNode> {
        find_by_id(top_level_nodes(tree), self.active.as_ref())
    }

    /// Nodes shown in the view: the open folder's children, or the
    /// top-level containers when no folder (or a vanished one) is open.
    pub fn current_nodes<'a>(&self, tree: &'a [BookmarkNode]) -> &'a [BookmarkNode] {
        match self.current_folder(tree) {
            Some(folder) => folder.children(),
            None => top_level_nodes(tree),
        }
    }

    /// Folder whose children the view shows, for write-back.
    pub fn parent_for_view(&self, tree: &[BookmarkNode]) -> Option<BookmarkId> {
        match self.current_folder(tree) {
            Some(folder) => Some(folder.id.clone()),
            None => tree.first().map(|root| root.id.clone()),
        }
    }

    /// Path to the open folder, minus the synthetic root.
    pub fn breadcrumbs(&self, tree: &[BookmarkNode]) -> Vec<Breadcrumb> {
        let Some(active) = self.active.as_ref() else {
            return Vec::new();
        };
        let Some(path) = find_path(tree, active) else {
            return Vec::new();
        };
        path.iter()
            .skip(1)
            .map(|n| Breadcrumb {
                id: n.id.clone(),
                title: tree::display_title(n).to_string(),
            })
            .collect()
    }

    /// Where "back" leads: the open folder's parent, or the top level.
    pub fn back_target(&self, tree: &[BookmarkNode]) -> Option<BookmarkId> {
        let active = self.active.as_ref()?;
        let path = find_path(tree, active)?;
        tree::parent_from_path(&path)
    }
}

// ============================================================================
// Folder click debounce
// ============================================================================

/// A single click on a folder that survived the debounce window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderGesture {
    pub id: BookmarkId,
    pub context: FolderContext,
}

/// Tells a single folder click apart from a double click.
///
/// A click arms a timer; if nothing cancels it within the delay, the
/// gesture is delivered on the channel. Re-arming, cancelling or dropping
/// the debouncer stops any pending timer, so a late timer can never fire
/// against a view the user has already left.
#[derive(Debug)]
pub struct ClickDebouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    tx: mpsc::UnboundedSender<FolderGesture>,
}

impl ClickDebouncer {
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<FolderGesture>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let debouncer = Self {
            delay,
            pending: Mutex::new(None),
            tx,
        };
        (debouncer, rx)
    }

    /// Arm the timer for `gesture`, replacing any pending one.
    pub fn schedule(&self, gesture: FolderGesture) {
        let tx = self.tx.clone();
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(gesture);
        });
        if let Some(previous) = self.pending.lock().replace(handle) {
            previous.abort();
        }
    }

    /// Stop the pending timer, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending.lock().take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for ClickDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::fixtures::sample_tree;

    #[test]
    fn test_startup_wins_over_last_open() {
        let layout = LayoutState {
            last_open_folder: Some("4".into()),
            startup_folder_id: Some("7".into()),
            ..Default::default()
        };
        assert_eq!(initial_folder(&layout), Some("7".into()));
        assert_eq!(initial_folder(&LayoutState::default()), None);
    }

    #[test]
    fn test_heal_missing_startup_folder() {
        let tree = sample_tree();
        let mut layout = LayoutState {
            startup_folder_id: Some("99".into()),
            ..Default::default()
        };
        let mut active = Some(BookmarkId::new("99"));

        let healed = heal_startup_folder(&mut layout, &tree, &mut active).unwrap();
        assert_eq!(healed, StartupHealed { cleared: "99".into(), fell_back: true });
        assert!(layout.startup_folder_id.is_none());
        assert!(active.is_none());

        assert!(heal_startup_folder(&mut layout, &tree, &mut active).is_none());
    }

    #[test]
    fn test_heal_keeps_valid_folder_and_ignores_empty_tree() {
        let mut layout = LayoutState {
            startup_folder_id: Some("5".into()),
            ..Default::default()
        };
        let mut active = None;
        assert!(heal_startup_folder(&mut layout, &sample_tree(), &mut active).is_none());

        layout.startup_folder_id = Some("99".into());
        assert!(heal_startup_folder(&mut layout, &[], &mut active).is_none());
        assert_eq!(layout.startup_folder_id, Some("99".into()));
    }

    #[test]
    fn test_heal_leaves_other_active_folder() {
        let mut layout = LayoutState {
            startup_folder_id: Some("99".into()),
            ..Default::default()
        };
        let mut active = Some(BookmarkId::new("4"));
        let healed = heal_startup_folder(&mut layout, &sample_tree(), &mut active).unwrap();
        assert!(!healed.fell_back);
        assert_eq!(active, Some("4".into()));
    }

    #[test]
    fn test_breadcrumbs_and_back() {
        let tree = sample_tree();
        let mut layout = LayoutState::default();
        let mut nav = Navigator::default();
        assert!(nav.breadcrumbs(&tree).is_empty());
        assert_eq!(nav.back_target(&tree), None);

        nav.navigate(Some("5".into()), &mut layout);
        assert_eq!(layout.last_open_folder, Some("5".into()));
        let crumbs: Vec<_> = nav.breadcrumbs(&tree).into_iter().map(|b| b.title).collect();
        assert_eq!(crumbs, ["Bar", "Docs", "Rust"]);
        assert_eq!(nav.back_target(&tree), Some("4".into()));

        nav.navigate(Some("1".into()), &mut layout);
        assert_eq!(nav.back_target(&tree), None);
    }

    #[test]
    fn test_current_nodes_falls_back_to_top_level() {
        let tree = sample_tree();
        let mut nav = Navigator::new(Some("4".into()));
        assert_eq!(nav.current_nodes(&tree)[0].id, "5");
        assert_eq!(nav.parent_for_view(&tree), Some("4".into()));

        *nav.active_mut() = Some("99".into());
        assert_eq!(nav.current_nodes(&tree).len(), 2);
        assert_eq!(nav.parent_for_view(&tree), Some("0".into()));
        assert_eq!(nav.parent_for_view(&[]), None);
    }

    fn gesture(id: &str) -> FolderGesture {
        FolderGesture {
            id: id.into(),
            context: FolderContext::Root,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_fires_after_delay() {
        let (debouncer, mut rx) = ClickDebouncer::new(Duration::from_millis(220));
        debouncer.schedule(gesture("1"));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(rx.recv().await, Some(gesture("1")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_click_replaces_first() {
        let (debouncer, mut rx) = ClickDebouncer::new(Duration::from_millis(220));
        debouncer.schedule(gesture("1"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(gesture("7"));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(rx.recv().await, Some(gesture("7")));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop_stop_the_timer() {
        let (debouncer, mut rx) = ClickDebouncer::new(Duration::from_millis(220));
        debouncer.schedule(gesture("1"));
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        debouncer.schedule(gesture("7"));
        drop(debouncer);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(rx.recv().await, None);
    }
}
