//! Playlist intents
//!
//! Playlist edits go through the manager so the active queue follows the
//! current playlist.

use super::PlaybackManager;
use crate::error::Result;
use crate::events::PlayerEvent;
use vibria_core::{Playlist, PlaylistId, TrackRef};

impl PlaybackManager {
    fn playlists_changed(&self) {
        self.emit(PlayerEvent::PlaylistsChanged {
            current: self.playlists.current_id(),
        });
    }

    /// Re-derive the queue if `id` is the current playlist
    fn resync_if_current(&mut self, id: PlaylistId) {
        if self.playlists.current_id() == Some(id) {
            self.resync_queue();
        }
    }

    pub async fn create_playlist(&mut self, name: &str) -> Result<Playlist> {
        let playlist = self.playlists.create(name).await?;
        self.playlists_changed();
        Ok(playlist)
    }

    /// Delete a playlist; deleting the current one falls back to the library
    pub async fn delete_playlist(&mut self, id: PlaylistId) -> Result<Playlist> {
        let was_current = self.playlists.current_id() == Some(id);
        let removed = self.playlists.delete(id).await?;
        if was_current {
            self.resync_queue();
        }
        self.playlists_changed();
        Ok(removed)
    }

    /// Make a playlist (or the library for `None`) the queue source
    pub async fn select_playlist(&mut self, id: Option<PlaylistId>) -> Result<()> {
        self.playlists.select(id).await?;
        self.resync_queue();
        self.playlists_changed();
        Ok(())
    }

    pub async fn select_next_playlist(&mut self) -> Result<Option<PlaylistId>> {
        let id = self.playlists.select_next_playlist().await?;
        self.resync_queue();
        self.playlists_changed();
        Ok(id)
    }

    pub async fn select_previous_playlist(&mut self) -> Result<Option<PlaylistId>> {
        let id = self.playlists.select_previous_playlist().await?;
        self.resync_queue();
        self.playlists_changed();
        Ok(id)
    }

    /// Select Favorites, creating it on first use
    pub async fn select_favorites(&mut self) -> Result<PlaylistId> {
        let id = self.playlists.select_favorites().await?;
        self.resync_queue();
        self.playlists_changed();
        Ok(id)
    }

    /// Flip a track's Favorites membership. Returns whether it is now a favorite.
    pub async fn toggle_favorite(&mut self, track: TrackRef) -> Result<bool> {
        let favorite = self.playlists.toggle_favorite(track).await?;
        if let Some(id) = self.playlists.favorites().map(|p| p.id) {
            self.resync_if_current(id);
        }
        self.playlists_changed();
        Ok(favorite)
    }

    pub fn add_to_playlist(&mut self, id: PlaylistId, track: TrackRef) -> Result<bool> {
        let added = self.playlists.add_song(id, track)?;
        if added {
            self.resync_if_current(id);
            self.playlists_changed();
        }
        Ok(added)
    }

    pub fn remove_from_playlist(&mut self, id: PlaylistId, track: &TrackRef) -> Result<bool> {
        let removed = self.playlists.remove_song(id, track)?;
        if removed {
            self.resync_if_current(id);
            self.playlists_changed();
        }
        Ok(removed)
    }

    pub fn move_in_playlist(&mut self, id: PlaylistId, from: usize, to: usize) -> Result<()> {
        self.playlists.move_song(id, from, to)?;
        self.resync_if_current(id);
        self.playlists_changed();
        Ok(())
    }

    pub fn update_playlist_songs(&mut self, id: PlaylistId, songs: Vec<TrackRef>) -> Result<()> {
        self.playlists.update_songs(id, songs)?;
        self.resync_if_current(id);
        self.playlists_changed();
        Ok(())
    }

    /// Write playlists now, trimming to the newest user playlists
    pub async fn save_playlists_now(&mut self) -> Result<()> {
        let current = self.playlists.current_id();
        self.playlists.save_now().await?;
        if self.playlists.current_id() != current {
            self.resync_queue();
        }
        self.playlists_changed();
        Ok(())
    }
}
