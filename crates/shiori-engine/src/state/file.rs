//! Directory-backed state store: `<dir>/<key>.json` per key.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::debug;

use shiori_types::StorageKey;

use super::{StateResult, StateStore};

/// Distinguishes tmp files of writes in flight at the same time.
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// One JSON file per key, written via tmp file + rename.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, key: StorageKey) -> StateResult<Option<serde_json::Value>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: StorageKey, value: serde_json::Value) -> StateResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!("{}.json.{}.{seq}.tmp", key.as_str(), std::process::id()));
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(&value)?).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!(key = %key, "state written");
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> StateResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_values_persist_per_key() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path().join("state"));

        store.set(StorageKey::SearchSettings, json!({"defaultEngine": "bing"})).await.unwrap();
        assert!(dir.path().join("state/search_settings.json").exists());

        let reopened = FileStateStore::new(dir.path().join("state"));
        let value = reopened.get(StorageKey::SearchSettings).await.unwrap().unwrap();
        assert_eq!(value["defaultEngine"], "bing");
        assert!(reopened.get(StorageKey::Layout).await.unwrap().is_none());

        reopened.remove(StorageKey::SearchSettings).await.unwrap();
        reopened.remove(StorageKey::SearchSettings).await.unwrap();
        assert!(reopened.get(StorageKey::SearchSettings).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sets_of_one_key_all_succeed() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(FileStateStore::new(dir.path()));

        let writers: Vec<_> = (0..16)
            .map(|n| {
                let store = store.clone();
                tokio::spawn(async move { store.set(StorageKey::Layout, json!({ "n": n })).await })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap().unwrap();
        }

        let value = store.get(StorageKey::Layout).await.unwrap().unwrap();
        assert!(value["n"].as_u64().is_some_and(|n| n < 16));
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }
}
