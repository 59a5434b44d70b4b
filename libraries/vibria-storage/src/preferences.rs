//! Playback preferences
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vibria_storage::{MemoryStore, Preferences};
//! # async fn example() -> vibria_core::Result<()> {
//! let prefs = Preferences::new(Arc::new(MemoryStore::new()));
//! prefs.set_resume_playback(false).await?;
//! assert!(!prefs.resume_playback().await?);
//! # Ok(())
//! # }
//! ```

use crate::store::{
    KEY_LOOP_MODE, KEY_RESUME_LAST_PLAYLIST, KEY_RESUME_PLAYBACK, KEY_SHUFFLE,
};
use std::sync::Arc;
use vibria_core::storage::{get_typed, set_typed};
use vibria_core::{KeyValueStore, LoopMode, Result};

/// Typed access to user preferences
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn flag(&self, key: &str, default: bool) -> Result<bool> {
        Ok(get_typed::<bool>(self.store.as_ref(), key)
            .await?
            .unwrap_or(default))
    }

    /// Restore the last selected playlist at launch (default on)
    pub async fn resume_last_playlist(&self) -> Result<bool> {
        self.flag(KEY_RESUME_LAST_PLAYLIST, true).await
    }

    pub async fn set_resume_last_playlist(&self, enabled: bool) -> Result<()> {
        set_typed(self.store.as_ref(), KEY_RESUME_LAST_PLAYLIST, &enabled).await
    }

    /// Restore the last played track and position at launch (default on)
    pub async fn resume_playback(&self) -> Result<bool> {
        self.flag(KEY_RESUME_PLAYBACK, true).await
    }

    pub async fn set_resume_playback(&self, enabled: bool) -> Result<()> {
        set_typed(self.store.as_ref(), KEY_RESUME_PLAYBACK, &enabled).await
    }

    pub async fn shuffle(&self) -> Result<bool> {
        self.flag(KEY_SHUFFLE, false).await
    }

    pub async fn set_shuffle(&self, enabled: bool) -> Result<()> {
        set_typed(self.store.as_ref(), KEY_SHUFFLE, &enabled).await
    }

    /// Stored loop mode. Unknown integers fall back to `Off`.
    pub async fn loop_mode(&self) -> Result<LoopMode> {
        let raw = get_typed::<i64>(self.store.as_ref(), KEY_LOOP_MODE).await?;
        Ok(raw
            .and_then(|value| LoopMode::try_from(value).ok())
            .unwrap_or_default())
    }

    pub async fn set_loop_mode(&self, mode: LoopMode) -> Result<()> {
        set_typed(self.store.as_ref(), KEY_LOOP_MODE, &mode.as_i64()).await
    }

    /// Remove the playback mode preferences (shuffle and loop)
    pub async fn clear_playback_modes(&self) -> Result<()> {
        self.store.remove(KEY_SHUFFLE).await?;
        self.store.remove(KEY_LOOP_MODE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[tokio::test]
    async fn test_defaults() {
        let prefs = Preferences::new(Arc::new(MemoryStore::new()));
        assert!(prefs.resume_last_playlist().await.unwrap());
        assert!(prefs.resume_playback().await.unwrap());
        assert!(!prefs.shuffle().await.unwrap());
        assert_eq!(prefs.loop_mode().await.unwrap(), LoopMode::Off);
    }

    #[tokio::test]
    async fn test_loop_mode_stored_as_integer() {
        let store = MemoryStore::new();
        let prefs = Preferences::new(Arc::new(store.clone()));
        prefs.set_loop_mode(LoopMode::All).await.unwrap();
        assert_eq!(store.peek(KEY_LOOP_MODE), Some(serde_json::json!(2)));
        assert_eq!(prefs.loop_mode().await.unwrap(), LoopMode::All);

        store.set(KEY_LOOP_MODE, serde_json::json!(9)).await.unwrap();
        assert_eq!(prefs.loop_mode().await.unwrap(), LoopMode::Off);
    }
}
