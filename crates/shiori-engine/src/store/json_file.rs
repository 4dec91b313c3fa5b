//! Bookmark store persisted as a JSON file.
//!
//! Stands in for the browser's bookmark service when running outside a
//! browser (the CLI). Reads are served from an in-memory working copy; every
//! successful write is flushed to disk via tmp file + rename. A write whose
//! flush fails is undone in memory too, so the file and the working copy
//! never disagree.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, warn};

use shiori_types::{BookmarkChanges, BookmarkId, BookmarkNode, CreateDetails, MoveDestination};

use super::error::StoreResult;
use super::memory::MemoryStore;
use super::ops::BookmarkStore;

/// File-backed bookmark store.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    working: MemoryStore,
    /// Held across each mutation and its flush.
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    /// Open `path`, creating it with the default containers if missing.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let working = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let tree: Vec<BookmarkNode> = serde_json::from_slice(&bytes)?;
                debug!(path = %path.display(), "loaded bookmark file");
                MemoryStore::from_tree(tree)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "bookmark file missing, starting fresh");
                MemoryStore::new()
            }
            Err(e) => return Err(e.into()),
        };
        let store = Self {
            path,
            working,
            write_lock: tokio::sync::Mutex::new(()),
        };
        store.flush().await?;
        Ok(store)
    }

    /// Flush a mutation already applied to the working copy, or put
    /// `before` back if the file can't be written.
    async fn commit(&self, before: Vec<BookmarkNode>) -> StoreResult<()> {
        if let Err(e) = self.flush().await {
            warn!(path = %self.path.display(), error = %e, "bookmark file write failed, change reverted");
            self.working.restore(before);
            return Err(e);
        }
        Ok(())
    }

    async fn flush(&self) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(&self.working.tree())?;
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl BookmarkStore for JsonFileStore {
    async fn get_tree(&self) -> StoreResult<Vec<BookmarkNode>> {
        self.working.get_tree().await
    }

    async fn get_children(&self, parent_id: &BookmarkId) -> StoreResult<Vec<BookmarkNode>> {
        self.working.get_children(parent_id).await
    }

    async fn get_sub_tree(&self, id: &BookmarkId) -> StoreResult<Vec<BookmarkNode>> {
        self.working.get_sub_tree(id).await
    }

    async fn create(&self, details: CreateDetails) -> StoreResult<BookmarkNode> {
        let _guard = self.write_lock.lock().await;
        let before = self.working.tree();
        let node = self.working.create(details).await?;
        self.commit(before).await?;
        Ok(node)
    }

    async fn move_node(&self, id: &BookmarkId, destination: MoveDestination) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let before = self.working.tree();
        self.working.move_node(id, destination).await?;
        self.commit(before).await
    }

    async fn remove(&self, id: &BookmarkId) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let before = self.working.tree();
        self.working.remove(id).await?;
        self.commit(before).await
    }

    async fn remove_tree(&self, id: &BookmarkId) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let before = self.working.tree();
        self.working.remove_tree(id).await?;
        self.commit(before).await
    }

    async fn update(&self, id: &BookmarkId, changes: BookmarkChanges) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        let before = self.working.tree();
        self.working.update(id, changes).await?;
        self.commit(before).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_changes_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bookmarks.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        let created = store
            .create(CreateDetails::bookmark("1", "Rust", "https://www.rust-lang.org"))
            .await
            .unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path).await.unwrap();
        let kids = reopened.get_children(&"1".into()).await.unwrap();
        assert_eq!(kids.len(), 1);
        assert_eq!(kids[0].id, created.id);
        assert_eq!(kids[0].url.as_deref(), Some("https://www.rust-lang.org"));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_memory_matching_disk() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        let path = data.join("bookmarks.json");

        let store = JsonFileStore::open(&path).await.unwrap();
        let kept = store
            .create(CreateDetails::bookmark("1", "Kept", "https://kept.example/"))
            .await
            .unwrap();
        let before = store.get_tree().await.unwrap();

        // Nothing can be written below a plain file.
        std::fs::remove_dir_all(&data).unwrap();
        std::fs::write(&data, b"").unwrap();

        assert!(
            store
                .create(CreateDetails::bookmark("1", "Lost", "https://lost.example/"))
                .await
                .is_err()
        );
        let rename = BookmarkChanges {
            title: Some("Renamed".into()),
            url: None,
        };
        assert!(store.update(&kept.id, rename).await.is_err());
        assert_eq!(store.get_tree().await.unwrap(), before);

        // Once the file is writable again the store carries on from there.
        std::fs::remove_file(&data).unwrap();
        store
            .create(CreateDetails::bookmark("1", "Next", "https://next.example/"))
            .await
            .unwrap();
        let reopened = JsonFileStore::open(&path).await.unwrap();
        let titles: Vec<_> = reopened
            .get_children(&"1".into())
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, ["Kept", "Next"]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bookmarks.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(JsonFileStore::open(&path).await.is_err());
    }
}
