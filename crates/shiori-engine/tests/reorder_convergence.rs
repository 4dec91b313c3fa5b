//! Property tests: writing any permutation back to a folder leaves the
//! store's children in exactly that order, whichever way the store reads a
//! same-folder move index.

use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;

use shiori_engine::reorder::reorder_children;
use shiori_engine::{
    BookmarkService, BookmarkStore, FlowBus, MemoryStateStore, MemoryStore, SnapshotStore, StoreResult,
};
use shiori_types::{BookmarkChanges, BookmarkId, BookmarkNode, CreateDetails, MoveDestination};

/// A store that reads a same-folder move index as a position in the list
/// *before* the node is taken out, the way browser bookmark services do:
/// moving the child at 0 to index 2 lands it at 1.
struct PreRemovalIndexStore {
    inner: MemoryStore,
}

#[async_trait]
impl BookmarkStore for PreRemovalIndexStore {
    async fn get_tree(&self) -> StoreResult<Vec<BookmarkNode>> {
        self.inner.get_tree().await
    }

    async fn get_children(&self, parent_id: &BookmarkId) -> StoreResult<Vec<BookmarkNode>> {
        self.inner.get_children(parent_id).await
    }

    async fn get_sub_tree(&self, id: &BookmarkId) -> StoreResult<Vec<BookmarkNode>> {
        self.inner.get_sub_tree(id).await
    }

    async fn create(&self, details: CreateDetails) -> StoreResult<BookmarkNode> {
        self.inner.create(details).await
    }

    async fn move_node(&self, id: &BookmarkId, mut destination: MoveDestination) -> StoreResult<()> {
        let current = self.inner.child_ids(destination.parent_id.as_str());
        if let (Some(from), Some(to)) = (current.iter().position(|c| c == id), destination.index) {
            if from < to {
                destination.index = Some(to - 1);
            }
        }
        self.inner.move_node(id, destination).await
    }

    async fn remove(&self, id: &BookmarkId) -> StoreResult<()> {
        self.inner.remove(id).await
    }

    async fn remove_tree(&self, id: &BookmarkId) -> StoreResult<()> {
        self.inner.remove_tree(id).await
    }

    async fn update(&self, id: &BookmarkId, changes: BookmarkChanges) -> StoreResult<()> {
        self.inner.update(id, changes).await
    }
}

fn folder_of(n: usize) -> MemoryStore {
    let children = (0..n)
        .map(|i| BookmarkNode::bookmark(format!("{}", 100 + i), format!("b{i}"), format!("https://{i}.example/")))
        .collect();
    MemoryStore::with_tree(vec![BookmarkNode::folder("1", "Bar", children)])
}

fn permutation() -> impl Strategy<Value = Vec<usize>> {
    (1usize..=50).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

#[test]
fn pre_removal_index_store_shifts_forward_moves() {
    let store = PreRemovalIndexStore { inner: folder_of(3) };
    runtime()
        .block_on(store.move_node(&"100".into(), MoveDestination::new("1", Some(2))))
        .unwrap();
    let ids: Vec<String> = store.inner.child_ids("1").iter().map(|id| id.to_string()).collect();
    assert_eq!(ids, ["101", "100", "102"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn reorder_reaches_requested_order(perm in permutation()) {
        let store = folder_of(perm.len());
        let wanted: Vec<BookmarkId> = perm.iter().map(|i| format!("{}", 100 + i).into()).collect();

        let moves = runtime().block_on(reorder_children(&store, &"1".into(), &wanted)).unwrap();
        prop_assert!(moves <= perm.len());
        prop_assert_eq!(store.child_ids("1"), wanted);
    }

    #[test]
    fn reorder_reaches_requested_order_with_pre_removal_indices(perm in permutation()) {
        let store = PreRemovalIndexStore { inner: folder_of(perm.len()) };
        let wanted: Vec<BookmarkId> = perm.iter().map(|i| format!("{}", 100 + i).into()).collect();

        runtime().block_on(reorder_children(&store, &"1".into(), &wanted)).unwrap();
        prop_assert_eq!(store.inner.child_ids("1"), wanted);
    }

    #[test]
    fn rerunning_after_partial_failure_converges(perm in permutation(), fail_at in 0usize..50) {
        let store = Arc::new(folder_of(perm.len()));
        let wanted: Vec<BookmarkId> = perm.iter().map(|i| format!("{}", 100 + i).into()).collect();
        let victim = wanted[fail_at % wanted.len()].clone();
        let rt = runtime();

        store.fail_moves_of(victim.clone());
        let first = rt.block_on(reorder_children(store.as_ref(), &"1".into(), &wanted));
        if first.is_err() {
            // Nothing before the failing step is undone.
            let kids = store.child_ids("1");
            prop_assert_eq!(kids.len(), wanted.len());
        }

        // A healthy store finishes the job on retry.
        let healed = Arc::new(MemoryStore::from_tree(store.tree()));
        let service = BookmarkService::new(
            healed.clone(),
            SnapshotStore::new(Arc::new(MemoryStateStore::new())),
            FlowBus::new(16),
        );
        let result = rt.block_on(service.reorder_children(Some(&"1".into()), &wanted));
        prop_assert!(result.success);
        prop_assert_eq!(healed.child_ids("1"), wanted);
    }
}
