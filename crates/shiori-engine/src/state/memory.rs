//! In-memory state store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use shiori_types::StorageKey;

use super::{StateError, StateResult, StateStore};

/// In-memory key-value state. Lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: RwLock<HashMap<StorageKey, serde_json::Value>>,
    failing: AtomicBool,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail, to exercise fire-and-forget error paths.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Current value under `key`, synchronously.
    pub fn peek(&self, key: StorageKey) -> Option<serde_json::Value> {
        self.values.read().get(&key).cloned()
    }

    /// Seed a value, synchronously.
    pub fn seed(&self, key: StorageKey, value: serde_json::Value) {
        self.values.write().insert(key, value);
    }

    fn check(&self) -> StateResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StateError::other("state storage is unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: StorageKey) -> StateResult<Option<serde_json::Value>> {
        self.check()?;
        Ok(self.values.read().get(&key).cloned())
    }

    async fn set(&self, key: StorageKey, value: serde_json::Value) -> StateResult<()> {
        self.check()?;
        self.values.write().insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: StorageKey) -> StateResult<()> {
        self.check()?;
        self.values.write().remove(&key);
        Ok(())
    }
}
