//! Cut/copy/paste over the bookmark tree.
//!
//! ```text
//!   empty ──cut/copy──▶ holding(item) ──cut/copy──▶ holding(newer item)
//!     ▲                     │
//!     └──paste(cut) ok──────┘     paste(copy) ok: stays holding
//! ```
//!
//! Paste re-reads the store before acting: the tree may have changed since
//! the item was captured, so neither the captured parent nor any cached
//! path is trusted.

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use shiori_types::{
    BookmarkAction, BookmarkId, BookmarkNode, ClipboardItem, ClipboardOp, CreateDetails, ItemKind,
    MoveDestination,
};

use crate::error::{EngineError, EngineResult};
use crate::flows::{BookmarkFlow, ChangeReason};
use crate::service::BookmarkService;
use crate::store::BookmarkStore;
use crate::tree::TreeIndex;

/// Result of a successful paste.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pasted {
    /// The moved node, or the top of the new copy.
    pub id: BookmarkId,
    /// Nodes created (0 for a cut).
    pub created: usize,
}

/// Holds at most one pending item; a newer cut/copy replaces it.
#[derive(Debug, Default)]
pub struct Clipboard {
    item: Mutex<Option<ClipboardItem>>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cut(&self, id: impl Into<BookmarkId>, title: impl Into<String>, kind: ItemKind, parent_id: impl Into<BookmarkId>) {
        self.hold(id.into(), title.into(), kind, ClipboardOp::Cut, parent_id.into());
    }

    pub fn copy(&self, id: impl Into<BookmarkId>, title: impl Into<String>, kind: ItemKind, parent_id: impl Into<BookmarkId>) {
        self.hold(id.into(), title.into(), kind, ClipboardOp::Copy, parent_id.into());
    }

    fn hold(&self, id: BookmarkId, title: String, kind: ItemKind, operation: ClipboardOp, parent_id: BookmarkId) {
        debug!(id = %id, op = %operation, "clipboard holds item");
        *self.item.lock() = Some(ClipboardItem {
            id,
            title,
            kind,
            operation,
            parent_id,
        });
    }

    pub fn current(&self) -> Option<ClipboardItem> {
        self.item.lock().clone()
    }

    pub fn clear(&self) {
        *self.item.lock() = None;
    }

    /// Paste into `target_parent` at `index` (appended when `None`).
    pub async fn paste(
        &self,
        service: &BookmarkService,
        target_parent: &BookmarkId,
        index: Option<usize>,
    ) -> EngineResult<Pasted> {
        let item = self.current().ok_or(EngineError::ClipboardEmpty)?;

        if item.kind == ItemKind::Folder {
            let tree = service.store().get_tree().await?;
            if TreeIndex::build(&tree).is_self_or_ancestor(&item.id, target_parent) {
                warn!(id = %item.id, target = %target_parent, "paste would create a cycle");
                return Err(EngineError::PasteCycle(item.id));
            }
        }

        let pasted = match item.operation {
            ClipboardOp::Cut => {
                service
                    .execute(BookmarkAction::Move {
                        id: item.id.clone(),
                        destination: MoveDestination::new(target_parent, index),
                    })
                    .await?;
                // Only consume the item we pasted; a newer cut/copy survives.
                let mut slot = self.item.lock();
                if slot.as_ref() == Some(&item) {
                    *slot = None;
                }
                Pasted {
                    id: item.id.clone(),
                    created: 0,
                }
            }
            ClipboardOp::Copy => {
                let source = fetch_node(service.store(), &item.id).await?;
                match source.url.clone() {
                    Some(url) => {
                        let created = service
                            .execute(BookmarkAction::Create(
                                CreateDetails::bookmark(target_parent, source.title.clone(), url).at(index),
                            ))
                            .await?
                            .ok_or_else(|| EngineError::NotFound(item.id.clone()))?;
                        Pasted {
                            id: created.id,
                            created: 1,
                        }
                    }
                    None => copy_folder(service, &source, target_parent, index).await?,
                }
            }
        };
        info!(id = %item.id, op = %item.operation, target = %target_parent, "pasted");
        Ok(pasted)
    }
}

async fn fetch_node(store: &dyn BookmarkStore, id: &BookmarkId) -> EngineResult<BookmarkNode> {
    store
        .get_sub_tree(id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::NotFound(id.clone()))
}

/// Duplicate `source` under `target_parent`, then announce once.
async fn copy_folder(
    service: &BookmarkService,
    source: &BookmarkNode,
    target_parent: &BookmarkId,
    index: Option<usize>,
) -> EngineResult<Pasted> {
    let result = duplicate_subtree(service, source, target_parent, index).await;
    let created = match &result {
        Ok(pasted) => pasted.created,
        Err(Failed { created, .. }) => *created,
    };
    if created > 0 {
        service
            .changed(BookmarkFlow::changed_in(ChangeReason::Paste, target_parent.clone()))
            .await;
    }
    result.map_err(|f| f.error)
}

struct Failed {
    created: usize,
    error: EngineError,
}

/// Create a copy of `source` and everything under it, depth-first.
///
/// Each folder is created before its children, and children are appended
/// in source order, so the copy matches the source's ordering. A failed
/// create stops the copy; nodes already created are left in place.
async fn duplicate_subtree(
    service: &BookmarkService,
    source: &BookmarkNode,
    target_parent: &BookmarkId,
    index: Option<usize>,
) -> Result<Pasted, Failed> {
    let mut stack: Vec<(&BookmarkNode, BookmarkId, Option<usize>)> =
        vec![(source, target_parent.clone(), index)];
    let mut top: Option<BookmarkId> = None;
    let mut created = 0;

    while let Some((node, parent, at)) = stack.pop() {
        let details = CreateDetails {
            parent_id: parent,
            title: node.title.clone(),
            url: node.url.clone(),
            index: at,
        };
        let copy = service.create_quiet(details).await.map_err(|e| Failed {
            created,
            error: match e {
                EngineError::Store(source) => EngineError::batch_step(created, node.id.clone(), source),
                other => other,
            },
        })?;
        created += 1;
        top.get_or_insert_with(|| copy.id.clone());
        if node.is_folder() {
            stack.extend(node.children().iter().rev().map(|c| (c, copy.id.clone(), None)));
        }
    }

    Ok(Pasted {
        id: top.unwrap_or_else(|| source.id.clone()),
        created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flows::BookmarkBus;
    use crate::snapshot::SnapshotStore;
    use crate::state::MemoryStateStore;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    /// "1" Bar ─ "2" B, "3" Docs ─ ("4" Rust ─ "5" book, "6" std), "7" Other
    fn setup() -> (Arc<MemoryStore>, BookmarkService) {
        let store = Arc::new(MemoryStore::with_tree(vec![
            BookmarkNode::folder(
                "1",
                "Bar",
                vec![
                    BookmarkNode::bookmark("2", "B", "https://x"),
                    BookmarkNode::folder(
                        "3",
                        "Docs",
                        vec![
                            BookmarkNode::folder("4", "Rust", vec![BookmarkNode::bookmark("5", "book", "https://b")]),
                            BookmarkNode::bookmark("6", "std", "https://s"),
                        ],
                    ),
                ],
            ),
            BookmarkNode::folder("7", "Other", vec![]),
        ]));
        let service = BookmarkService::new(
            store.clone(),
            SnapshotStore::new(Arc::new(MemoryStateStore::new())),
            BookmarkBus::new(32),
        );
        (store, service)
    }

    fn titles(store: &MemoryStore, parent: &str) -> Vec<String> {
        let tree = store.tree();
        crate::tree::find_by_id(&tree, Some(&parent.into()))
            .map(|n| n.children().iter().map(|c| c.title.clone()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_paste_empty() {
        let (_store, service) = setup();
        let err = Clipboard::new().paste(&service, &"7".into(), None).await.unwrap_err();
        assert!(matches!(err, EngineError::ClipboardEmpty));
    }

    #[tokio::test]
    async fn test_cut_is_consumed() {
        let (store, service) = setup();
        let clipboard = Clipboard::new();
        clipboard.cut("2", "B", ItemKind::Bookmark, "1");

        let pasted = clipboard.paste(&service, &"7".into(), None).await.unwrap();
        assert_eq!(pasted, Pasted { id: "2".into(), created: 0 });
        assert_eq!(titles(&store, "7"), ["B"]);
        assert!(clipboard.current().is_none());

        let err = clipboard.paste(&service, &"7".into(), None).await.unwrap_err();
        assert!(matches!(err, EngineError::ClipboardEmpty));
    }

    #[tokio::test]
    async fn test_copy_bookmark_is_repeatable() {
        let (store, service) = setup();
        let clipboard = Clipboard::new();
        clipboard.copy("2", "B", ItemKind::Bookmark, "1");

        clipboard.paste(&service, &"7".into(), None).await.unwrap();
        clipboard.paste(&service, &"7".into(), Some(0)).await.unwrap();
        assert_eq!(titles(&store, "7"), ["B", "B"]);
        assert!(clipboard.current().is_some());
        assert_eq!(titles(&store, "1").len(), 2);
    }

    #[tokio::test]
    async fn test_copy_keeps_stored_title_not_display_title() {
        let (store, service) = setup();
        let untitled = service
            .execute(BookmarkAction::Create(CreateDetails::bookmark("1", "", "https://untitled.example/")))
            .await
            .unwrap()
            .unwrap();
        let clipboard = Clipboard::new();
        // Views hand over the label they render, which falls back to the url.
        clipboard.copy(untitled.id.clone(), "https://untitled.example/", ItemKind::Bookmark, "1");

        let pasted = clipboard.paste(&service, &"7".into(), None).await.unwrap();
        let tree = store.tree();
        let copy = crate::tree::find_by_id(&tree, Some(&pasted.id)).unwrap();
        assert_eq!(copy.title, "");
        assert_eq!(copy.url.as_deref(), Some("https://untitled.example/"));
    }

    #[tokio::test]
    async fn test_copy_folder_preserves_shape_and_order() {
        let (store, service) = setup();
        let clipboard = Clipboard::new();
        clipboard.copy("3", "Docs", ItemKind::Folder, "1");

        let pasted = clipboard.paste(&service, &"7".into(), None).await.unwrap();
        assert_eq!(pasted.created, 4);

        let tree = store.tree();
        let copy = crate::tree::find_by_id(&tree, Some(&pasted.id)).unwrap();
        assert_eq!(copy.title, "Docs");
        let kids: Vec<_> = copy.children().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(kids, ["Rust", "std"]);
        assert_eq!(copy.children()[0].children()[0].url.as_deref(), Some("https://b"));
        assert_ne!(copy.id, "3");
    }

    #[tokio::test]
    async fn test_folder_into_own_subtree_is_a_cycle() {
        let (store, service) = setup();
        let clipboard = Clipboard::new();
        for target in ["3", "4"] {
            for op in [ClipboardOp::Cut, ClipboardOp::Copy] {
                match op {
                    ClipboardOp::Cut => clipboard.cut("3", "Docs", ItemKind::Folder, "1"),
                    ClipboardOp::Copy => clipboard.copy("3", "Docs", ItemKind::Folder, "1"),
                }
                let err = clipboard.paste(&service, &target.into(), None).await.unwrap_err();
                assert!(matches!(err, EngineError::PasteCycle(_)), "{op} into {target}");
            }
        }
        assert_eq!(store.write_count(), 0);
        assert!(clipboard.current().is_some());
    }

    #[tokio::test]
    async fn test_partial_copy_reports_step_and_keeps_created_nodes() {
        let (store, service) = setup();
        let mut sub = service.bus().subscribe("bookmarks.changed");
        let clipboard = Clipboard::new();
        clipboard.copy("3", "Docs", ItemKind::Folder, "1");
        store.fail_creates_after(2);

        let err = clipboard.paste(&service, &"7".into(), None).await.unwrap_err();
        match err {
            EngineError::BatchStep { step, id, .. } => {
                assert_eq!(step, 2);
                assert_eq!(id, "5");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(titles(&store, "7"), ["Docs"]);
        assert!(sub.try_recv().is_some());
    }
}
