//! Snapshot store: the last-known tree, for offline fallback.
//!
//! Written after every successful load or mutation, read once at startup
//! (or whenever the live store fails). Never authoritative while the store
//! is reachable. Last writer wins; there is no merge. Writes from one
//! instance are serialized so stamp order and storage order agree.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use shiori_types::{BookmarkNode, BookmarkSnapshot, StorageKey};

use crate::state::{StateResult, StateStore, save_typed};

/// Reads and writes [`BookmarkSnapshot`]s under [`StorageKey::Snapshot`].
pub struct SnapshotStore {
    state: Arc<dyn StateStore>,
    version: u32,
    /// Newest timestamp this instance has written or read.
    last_stamp: Mutex<Option<DateTime<Utc>>>,
    /// Held from stamping until the value is stored.
    write_lock: tokio::sync::Mutex<()>,
}

impl SnapshotStore {
    pub fn new(state: Arc<dyn StateStore>) -> Self {
        Self::with_version(state, shiori_types::SNAPSHOT_VERSION)
    }

    pub fn with_version(state: Arc<dyn StateStore>, version: u32) -> Self {
        Self {
            state,
            version,
            last_stamp: Mutex::new(None),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The stored snapshot, if any.
    ///
    /// A value that no longer deserializes is treated as absent: the
    /// snapshot is a cache and the next write replaces it.
    pub async fn read(&self) -> StateResult<Option<BookmarkSnapshot>> {
        let Some(value) = self.state.get(StorageKey::Snapshot).await? else {
            return Ok(None);
        };
        match serde_json::from_value::<BookmarkSnapshot>(value) {
            Ok(snapshot) => {
                self.observe(snapshot.updated_at);
                Ok(Some(snapshot))
            }
            Err(e) => {
                warn!(error = %e, "discarding unreadable bookmark snapshot");
                Ok(None)
            }
        }
    }

    /// Stamp `tree` with the current time, persist it and return it.
    pub async fn write(&self, tree: Vec<BookmarkNode>) -> StateResult<BookmarkSnapshot> {
        let _guard = self.write_lock.lock().await;
        let mut snapshot = BookmarkSnapshot::new(tree, self.next_stamp());
        snapshot.version = self.version;
        save_typed(self.state.as_ref(), StorageKey::Snapshot, &snapshot).await?;
        debug!(updated_at = %snapshot.updated_at, "snapshot written");
        Ok(snapshot)
    }

    /// `now`, clamped so it never goes backwards.
    fn next_stamp(&self) -> DateTime<Utc> {
        let mut last = self.last_stamp.lock();
        let now = Utc::now();
        let stamp = match *last {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        *last = Some(stamp);
        stamp
    }

    fn observe(&self, at: DateTime<Utc>) {
        let mut last = self.last_stamp.lock();
        if last.is_none_or(|prev| at > prev) {
            *last = Some(at);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FileStateStore, MemoryStateStore};
    use chrono::Duration;
    use tempfile::TempDir;

    fn tree() -> Vec<BookmarkNode> {
        vec![BookmarkNode::folder("0", "", vec![BookmarkNode::folder("1", "Bar", vec![])])]
    }

    #[tokio::test]
    async fn test_read_empty_is_none() {
        let snapshots = SnapshotStore::new(Arc::new(MemoryStateStore::new()));
        assert!(snapshots.read().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let snapshots = SnapshotStore::new(Arc::new(MemoryStateStore::new()));
        let written = snapshots.write(tree()).await.unwrap();
        let read = snapshots.read().await.unwrap().unwrap();
        assert_eq!(read, written);
        assert_eq!(read.version, 1);
    }

    #[tokio::test]
    async fn test_timestamps_never_go_backwards() {
        let state = Arc::new(MemoryStateStore::new());
        // A snapshot from a clock that ran ahead.
        let future = Utc::now() + Duration::hours(1);
        state.seed(
            StorageKey::Snapshot,
            serde_json::to_value(BookmarkSnapshot::new(tree(), future)).unwrap(),
        );

        let snapshots = SnapshotStore::new(state);
        snapshots.read().await.unwrap();
        let a = snapshots.write(tree()).await.unwrap();
        let b = snapshots.write(tree()).await.unwrap();
        assert!(a.updated_at >= future);
        assert!(b.updated_at >= a.updated_at);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_keep_newest_on_disk() {
        let dir = TempDir::new().unwrap();
        let snapshots = Arc::new(SnapshotStore::new(Arc::new(FileStateStore::new(dir.path()))));

        for _ in 0..50 {
            let writers: Vec<_> = (0..4)
                .map(|_| {
                    let snapshots = snapshots.clone();
                    tokio::spawn(async move { snapshots.write(tree()).await })
                })
                .collect();

            let mut newest = None;
            for writer in writers {
                let written = writer.await.unwrap().unwrap();
                newest = newest.max(Some(written.updated_at));
            }

            let stored = snapshots.read().await.unwrap().unwrap();
            assert_eq!(Some(stored.updated_at), newest);
        }
    }

    #[tokio::test]
    async fn test_unreadable_snapshot_is_absent() {
        let state = Arc::new(MemoryStateStore::new());
        state.seed(StorageKey::Snapshot, serde_json::json!({"tree": "nope"}));
        let snapshots = SnapshotStore::new(state);
        assert!(snapshots.read().await.unwrap().is_none());
    }
}
