//! Library bookmarks
//!
//! Persists one access token per imported track so the library survives a
//! relaunch.

use crate::store::KEY_LIBRARY_BOOKMARKS;
use std::sync::Arc;
use tracing::{debug, warn};
use vibria_core::storage::{get_typed, set_typed};
use vibria_core::{AccessToken, FileAccess, KeyValueStore, Result, TrackRef};

/// Token list for the imported library
#[derive(Clone)]
pub struct BookmarkStore {
    store: Arc<dyn KeyValueStore>,
    access: Arc<dyn FileAccess>,
}

impl BookmarkStore {
    pub fn new(store: Arc<dyn KeyValueStore>, access: Arc<dyn FileAccess>) -> Self {
        Self { store, access }
    }

    /// Create tokens for every track that can be bookmarked
    ///
    /// Tracks the platform refuses are skipped and logged.
    pub fn tokens_for(&self, tracks: &[TrackRef]) -> Vec<AccessToken> {
        tracks
            .iter()
            .filter_map(|track| match self.access.create_token(track) {
                Ok(token) => Some(token),
                Err(e) => {
                    warn!("Skipping bookmark for {}: {}", track, e);
                    None
                }
            })
            .collect()
    }

    /// Persist tokens for `tracks`, an empty list included
    pub async fn save(&self, tracks: &[TrackRef]) -> Result<()> {
        let tokens = self.tokens_for(tracks);
        debug!("Saving {} library bookmarks", tokens.len());
        set_typed(self.store.as_ref(), KEY_LIBRARY_BOOKMARKS, &tokens).await
    }

    /// Resolve every stored token, skipping the ones that no longer resolve
    pub async fn load(&self) -> Result<Vec<TrackRef>> {
        let tokens: Vec<AccessToken> = match get_typed(self.store.as_ref(), KEY_LIBRARY_BOOKMARKS).await {
            Ok(tokens) => tokens.unwrap_or_default(),
            Err(e) => {
                warn!("Stored library bookmarks are unreadable: {}", e);
                Vec::new()
            }
        };

        let tracks: Vec<TrackRef> = tokens
            .iter()
            .filter_map(|token| match self.access.resolve_token(token) {
                Ok(track) => Some(track),
                Err(e) => {
                    warn!("Failed to resolve bookmark: {}", e);
                    None
                }
            })
            .collect();

        debug!("Restored {}/{} library bookmarks", tracks.len(), tokens.len());
        Ok(tracks)
    }

    /// Overwrite the stored list with an empty one
    pub async fn clear(&self) -> Result<()> {
        set_typed(self.store.as_ref(), KEY_LIBRARY_BOOKMARKS, &Vec::<AccessToken>::new()).await
    }
}
