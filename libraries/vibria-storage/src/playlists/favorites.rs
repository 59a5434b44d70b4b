//! Favorites resolution and toggling

use super::{PlaylistStore, Result};
use crate::store::KEY_FAVORITES_ID;
use tracing::{debug, warn};
use vibria_core::{Playlist, PlaylistId, TrackRef};

/// Name given to a newly created Favorites playlist and used to find it
/// when no id has been persisted
pub const FAVORITES_DEFAULT_NAME: &str = "❤️ Ulubione";

impl PlaylistStore {
    /// Favorites id by stored id, else by default name
    pub(crate) fn find_favorites_id(&self) -> Option<PlaylistId> {
        if let Some(id) = self.favorites_id {
            if self.get(id).is_some() {
                return Some(id);
            }
        }
        self.playlists
            .iter()
            .find(|p| p.name == FAVORITES_DEFAULT_NAME)
            .map(|p| p.id)
    }

    /// Resolve the Favorites id, persisting it when found by name
    pub async fn resolve_favorites_id(&mut self) -> Result<Option<PlaylistId>> {
        let resolved = self.find_favorites_id();
        if let Some(id) = resolved {
            if self.favorites_id != Some(id) {
                debug!("Favorites found by name, remembering id {}", id);
                self.persist_favorites_id(id).await;
            }
        }
        Ok(resolved)
    }

    /// Remember the Favorites id; a failed write is logged and the name
    /// lookup still finds the playlist
    async fn persist_favorites_id(&mut self, id: PlaylistId) {
        self.favorites_id = Some(id);
        if let Err(e) = self
            .store
            .set(KEY_FAVORITES_ID, serde_json::Value::String(id.to_string()))
            .await
        {
            warn!("Failed to persist the Favorites id: {}", e);
        }
    }

    /// The Favorites playlist, if it exists
    pub fn favorites(&self) -> Option<&Playlist> {
        self.find_favorites_id().and_then(|id| self.get(id))
    }

    pub fn favorites_count(&self) -> usize {
        self.favorites().map_or(0, |p| p.songs.len())
    }

    pub fn is_favorite(&self, track: &TrackRef) -> bool {
        self.favorites().is_some_and(|p| p.contains(track))
    }

    /// Return the Favorites id, creating the playlist if missing
    pub async fn ensure_favorites_exists(&mut self) -> Result<PlaylistId> {
        if let Some(id) = self.resolve_favorites_id().await? {
            return Ok(id);
        }

        let favorites = Playlist::new(FAVORITES_DEFAULT_NAME);
        let id = favorites.id;
        self.playlists.push(favorites);
        self.persist_favorites_id(id).await;
        self.schedule_save();
        Ok(id)
    }

    pub async fn add_to_favorites(&mut self, track: TrackRef) -> Result<bool> {
        let id = self.ensure_favorites_exists().await?;
        self.add_song(id, track)
    }

    pub async fn remove_from_favorites(&mut self, track: &TrackRef) -> Result<bool> {
        match self.resolve_favorites_id().await? {
            Some(id) => self.remove_song(id, track),
            None => Ok(false),
        }
    }

    /// Flip membership in Favorites. Returns whether the track is now a favorite.
    pub async fn toggle_favorite(&mut self, track: TrackRef) -> Result<bool> {
        if self.is_favorite(&track) {
            self.remove_from_favorites(&track).await?;
            Ok(false)
        } else {
            self.add_to_favorites(track).await?;
            Ok(true)
        }
    }

    /// Select Favorites, creating it if needed
    pub async fn select_favorites(&mut self) -> Result<PlaylistId> {
        let id = self.ensure_favorites_exists().await?;
        self.select(Some(id)).await?;
        Ok(id)
    }
}
