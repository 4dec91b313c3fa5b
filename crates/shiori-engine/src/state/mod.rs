//! Persisted key-value state.
//!
//! The browser's `storage.local` as the engine consumes it: a handful of
//! JSON values under fixed [`StorageKey`](shiori_types::StorageKey)s.
//!
//! - [`StateStore`] - get/set/remove by key
//! - [`MemoryStateStore`] - in-process, for tests and ephemeral sessions
//! - [`FileStateStore`] - one JSON file per key in a directory

mod error;
mod file;
mod memory;

pub use error::{StateError, StateResult};
pub use file::FileStateStore;
pub use memory::MemoryStateStore;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use shiori_types::StorageKey;

/// Persisted key-value operations.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Value under `key`, or `None` if never written.
    async fn get(&self, key: StorageKey) -> StateResult<Option<serde_json::Value>>;

    /// Replace the value under `key`.
    async fn set(&self, key: StorageKey, value: serde_json::Value) -> StateResult<()>;

    /// Delete `key`. Removing a missing key is not an error.
    async fn remove(&self, key: StorageKey) -> StateResult<()>;
}

/// Typed read of a key.
pub async fn load_typed<T: DeserializeOwned>(
    store: &dyn StateStore,
    key: StorageKey,
) -> StateResult<Option<T>> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Typed write of a key.
pub async fn save_typed<T: Serialize + ?Sized>(
    store: &dyn StateStore,
    key: StorageKey,
    value: &T,
) -> StateResult<()> {
    store.set(key, serde_json::to_value(value)?).await
}
