//! In-memory key-value store

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use vibria_core::{KeyValueStore, Result};

/// Volatile store, used by tests and dry runs
///
/// Clones share the same map. Every `set` is counted so tests can assert
/// how many writes a burst of mutations produced.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<String, serde_json::Value>,
    writes: HashMap<String, usize>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        // Poisoned by a panicking test; the map itself is still consistent
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Number of `set` calls made for `key`
    pub fn write_count(&self, key: &str) -> usize {
        self.lock().writes.get(key).copied().unwrap_or(0)
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// Snapshot of a value without going through the async trait
    pub fn peek(&self, key: &str) -> Option<serde_json::Value> {
        self.lock().entries.get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.peek(key))
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut inner = self.lock();
        inner.entries.insert(key.to_string(), value);
        *inner.writes.entry(key.to_string()).or_default() += 1;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.lock().entries.remove(key);
        Ok(())
    }
}
