//! Last played track and position

use crate::store::{KEY_LAST_PLAYED_TIME, KEY_LAST_PLAYED_TOKEN};
use std::sync::Arc;
use tracing::{debug, warn};
use vibria_core::storage::{get_typed, set_typed};
use vibria_core::{AccessToken, FileAccess, KeyValueStore, Result, TrackRef, VibriaError};

/// Single-slot record of what was playing and where
#[derive(Clone)]
pub struct LastPlayedStore {
    store: Arc<dyn KeyValueStore>,
    access: Arc<dyn FileAccess>,
}

impl LastPlayedStore {
    pub fn new(store: Arc<dyn KeyValueStore>, access: Arc<dyn FileAccess>) -> Self {
        Self { store, access }
    }

    /// Overwrite the record. Tracks that cannot be bookmarked are ignored.
    pub async fn save(&self, track: &TrackRef, seconds: f64) -> Result<()> {
        let Ok(token) = self.access.create_token(track) else {
            debug!("No bookmark for {}, last played not updated", track);
            return Ok(());
        };
        set_typed(self.store.as_ref(), KEY_LAST_PLAYED_TOKEN, &token).await?;
        set_typed(self.store.as_ref(), KEY_LAST_PLAYED_TIME, &seconds).await
    }

    /// Restore the record, `None` when absent or the file no longer resolves
    pub async fn load(&self) -> Result<Option<(TrackRef, f64)>> {
        let token = match get_typed::<AccessToken>(self.store.as_ref(), KEY_LAST_PLAYED_TOKEN).await {
            Ok(Some(token)) => token,
            Ok(None) => return Ok(None),
            Err(VibriaError::Serialization(e)) => {
                warn!("Stored last played track is unreadable: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let track = match self.access.resolve_token(&token) {
            Ok(track) => track,
            Err(e) => {
                debug!("Last played track no longer resolves: {}", e);
                return Ok(None);
            }
        };

        let seconds = match get_typed::<f64>(self.store.as_ref(), KEY_LAST_PLAYED_TIME).await {
            Ok(seconds) => seconds.unwrap_or(0.0),
            Err(VibriaError::Serialization(e)) => {
                warn!("Stored last played position is unreadable: {}", e);
                0.0
            }
            Err(e) => return Err(e),
        };
        Ok(Some((track, seconds)))
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(KEY_LAST_PLAYED_TOKEN).await?;
        self.store.remove(KEY_LAST_PLAYED_TIME).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use vibria_core::LocalFileAccess;

    #[tokio::test]
    async fn test_save_overwrites_and_load_restores() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.mp3");
        let second = dir.path().join("second.mp3");
        std::fs::write(&first, b"x").unwrap();
        std::fs::write(&second, b"x").unwrap();

        let last = LastPlayedStore::new(Arc::new(MemoryStore::new()), Arc::new(LocalFileAccess));
        assert!(last.load().await.unwrap().is_none());

        last.save(&TrackRef::new(&first), 12.0).await.unwrap();
        last.save(&TrackRef::new(&second), 47.5).await.unwrap();
        assert_eq!(
            last.load().await.unwrap(),
            Some((TrackRef::new(&second), 47.5))
        );

        last.clear().await.unwrap();
        assert!(last.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_record_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let song = dir.path().join("song.mp3");
        std::fs::write(&song, b"x").unwrap();

        let store = MemoryStore::new();
        let last = LastPlayedStore::new(Arc::new(store.clone()), Arc::new(LocalFileAccess));

        store
            .set(KEY_LAST_PLAYED_TOKEN, serde_json::json!("%%% not base64"))
            .await
            .unwrap();
        assert!(last.load().await.unwrap().is_none());

        // A bad position keeps the track and starts from zero
        last.save(&TrackRef::new(&song), 30.0).await.unwrap();
        store
            .set(KEY_LAST_PLAYED_TIME, serde_json::json!("half way"))
            .await
            .unwrap();
        assert_eq!(last.load().await.unwrap(), Some((TrackRef::new(&song), 0.0)));
    }
}
