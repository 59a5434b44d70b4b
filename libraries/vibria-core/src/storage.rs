//! Key-value persistence trait

use crate::error::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Flat key-value store with JSON values
///
/// All player state (library bookmarks, playlists, progress, preferences) is
/// persisted through this trait so that backends can be swapped between a
/// `SQLite` file and an in-memory map.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Insert or overwrite a value
    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Remove several keys
    async fn remove_many(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}

/// Read and deserialize a typed value
///
/// # Errors
/// Returns an error if the backend fails or the stored JSON has the wrong shape
pub async fn get_typed<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Serialize and write a typed value
///
/// # Errors
/// Returns an error if serialization or the backend fails
pub async fn set_typed<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    store.set(key, serde_json::to_value(value)?).await
}
