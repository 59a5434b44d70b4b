//! Playlists and Favorites
//!
//! Owns the ordered playlist list and the current selection. Every mutation
//! schedules a debounced save of the whole list; [`PlaylistStore::save_now`]
//! and [`PlaylistStore::flush_pending`] write synchronously.
//!
//! Favorites is an ordinary playlist found by its persisted id, falling back
//! to the well-known default name. It does not count towards the user
//! playlist cap.

mod favorites;

pub use favorites::FAVORITES_DEFAULT_NAME;

use crate::debounce::DebouncedWriter;
use crate::overlay::OverlayCoordinator;
use crate::preferences::Preferences;
use crate::store::{KEY_FAVORITES_ID, KEY_LAST_PLAYLIST_ID, KEY_PLAYLISTS};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use vibria_core::storage::get_typed;
use vibria_core::{KeyValueStore, Playlist, PlaylistId, TrackRef, VibriaError};

/// Maximum number of user playlists (Favorites excluded)
pub const DEFAULT_MAX_USER_PLAYLISTS: usize = 10;

/// Quiet period before a burst of playlist edits is written
pub const DEFAULT_PLAYLIST_DEBOUNCE: Duration = Duration::from_millis(600);

/// Playlist operation errors
#[derive(Debug, Error)]
pub enum PlaylistError {
    /// Name is empty after trimming
    #[error("Playlist name is empty")]
    EmptyName,

    /// User playlist cap reached
    #[error("Playlist limit reached ({max} playlists)")]
    LimitReached { max: usize },

    /// Another playlist already uses this name (case-insensitive)
    #[error("A playlist named {0:?} already exists")]
    DuplicateName(String),

    /// No playlist with this id
    #[error("Playlist not found: {0}")]
    NotFound(PlaylistId),

    /// Song index outside the playlist
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Persistence failure
    #[error(transparent)]
    Storage(#[from] VibriaError),
}

/// Result type for playlist operations
pub type Result<T> = std::result::Result<T, PlaylistError>;

/// Tunables for [`PlaylistStore`]
#[derive(Debug, Clone, Copy)]
pub struct PlaylistSettings {
    pub max_user_playlists: usize,
    pub debounce: Duration,
}

impl Default for PlaylistSettings {
    fn default() -> Self {
        Self {
            max_user_playlists: DEFAULT_MAX_USER_PLAYLISTS,
            debounce: DEFAULT_PLAYLIST_DEBOUNCE,
        }
    }
}

/// Playlist collection with debounced persistence
pub struct PlaylistStore {
    store: Arc<dyn KeyValueStore>,
    preferences: Preferences,
    playlists: Vec<Playlist>,
    current: Option<PlaylistId>,
    /// Last Favorites id read from or written to storage
    favorites_id: Option<PlaylistId>,
    writer: DebouncedWriter,
    settings: PlaylistSettings,
}

impl PlaylistStore {
    /// Create an empty store; call [`load`](Self::load) to read persisted state
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        overlay: OverlayCoordinator,
        settings: PlaylistSettings,
    ) -> Self {
        Self {
            preferences: Preferences::new(store.clone()),
            writer: DebouncedWriter::new(KEY_PLAYLISTS, settings.debounce, store.clone(), overlay),
            store,
            playlists: Vec::new(),
            current: None,
            favorites_id: None,
            settings,
        }
    }

    /// Read persisted playlists and, if enabled, restore the last selection
    ///
    /// Unreadable playlist data is logged and treated as empty.
    pub async fn load(&mut self) -> Result<()> {
        self.playlists = match get_typed::<Vec<Playlist>>(self.store.as_ref(), KEY_PLAYLISTS).await {
            Ok(playlists) => playlists.unwrap_or_default(),
            Err(e) => {
                warn!("Failed to load playlists: {}", e);
                Vec::new()
            }
        };

        self.favorites_id = self.stored_id(KEY_FAVORITES_ID).await;

        self.current = None;
        if self.preferences.resume_last_playlist().await? {
            if let Some(id) = self.stored_id(KEY_LAST_PLAYLIST_ID).await {
                if self.get(id).is_some() {
                    self.current = Some(id);
                }
            }
        }

        info!(
            "Loaded {} playlists (current: {:?})",
            self.playlists.len(),
            self.current
        );
        Ok(())
    }

    async fn stored_id(&self, key: &str) -> Option<PlaylistId> {
        match get_typed::<String>(self.store.as_ref(), key).await {
            Ok(raw) => raw.and_then(|raw| raw.parse().ok()),
            Err(e) => {
                warn!("Ignoring unreadable {}: {}", key, e);
                None
            }
        }
    }

    // ===== Queries =====

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }

    pub fn get(&self, id: PlaylistId) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: PlaylistId) -> Result<&mut Playlist> {
        self.playlists
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(PlaylistError::NotFound(id))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Playlist> {
        let name = name.trim();
        self.playlists.iter().find(|p| p.has_name_ignoring_case(name))
    }

    /// Currently selected playlist
    pub fn current(&self) -> Option<&Playlist> {
        self.current.and_then(|id| self.get(id))
    }

    pub fn current_id(&self) -> Option<PlaylistId> {
        self.current
    }

    /// Whether a debounced save is pending or being written
    pub fn is_saving(&self) -> bool {
        self.writer.is_saving()
    }

    /// Number of user playlists, excluding Favorites by id and by name
    pub fn user_playlist_count(&self) -> usize {
        let favorites = self.find_favorites_id();
        self.playlists
            .iter()
            .filter(|p| Some(p.id) != favorites && p.name != FAVORITES_DEFAULT_NAME)
            .count()
    }

    // ===== Playlist CRUD =====

    /// Create an empty playlist
    pub async fn create(&mut self, raw_name: &str) -> Result<Playlist> {
        let name = raw_name.trim();
        if name.is_empty() {
            return Err(PlaylistError::EmptyName);
        }

        self.resolve_favorites_id().await?;
        if self.user_playlist_count() >= self.settings.max_user_playlists {
            info!("Playlist limit reached, not creating {:?}", name);
            return Err(PlaylistError::LimitReached {
                max: self.settings.max_user_playlists,
            });
        }

        if self.find_by_name(name).is_some() {
            return Err(PlaylistError::DuplicateName(name.to_string()));
        }

        let playlist = Playlist::new(name);
        debug!("Created playlist {} ({})", playlist.name, playlist.id);
        self.playlists.push(playlist.clone());
        self.schedule_save();
        Ok(playlist)
    }

    /// Delete a playlist, clearing the selection if it was current
    pub async fn delete(&mut self, id: PlaylistId) -> Result<Playlist> {
        let index = self
            .playlists
            .iter()
            .position(|p| p.id == id)
            .ok_or(PlaylistError::NotFound(id))?;
        let removed = self.playlists.remove(index);

        if self.current == Some(id) {
            self.current = None;
        }
        if self.favorites_id == Some(id) {
            self.favorites_id = None;
            if let Err(e) = self.store.remove(KEY_FAVORITES_ID).await {
                warn!("Failed to forget the Favorites id: {}", e);
            }
        }

        self.schedule_save();
        Ok(removed)
    }

    /// Change the current playlist; `None` returns to the library
    ///
    /// The choice is remembered for the next launch when resuming the last
    /// playlist is enabled.
    pub async fn select(&mut self, id: Option<PlaylistId>) -> Result<()> {
        if let Some(id) = id {
            if self.get(id).is_none() {
                return Err(PlaylistError::NotFound(id));
            }
        }
        self.current = id;
        self.remember_selection(id).await;
        Ok(())
    }

    /// Persist the selection for the next launch; failures are only logged
    async fn remember_selection(&self, id: Option<PlaylistId>) {
        let resume = match self.preferences.resume_last_playlist().await {
            Ok(resume) => resume,
            Err(e) => {
                warn!("Failed to read the resume preference: {}", e);
                return;
            }
        };
        if !resume {
            return;
        }

        let result = match id {
            Some(id) => {
                self.store
                    .set(KEY_LAST_PLAYLIST_ID, serde_json::Value::String(id.to_string()))
                    .await
            }
            None => self.store.remove(KEY_LAST_PLAYLIST_ID).await,
        };
        if let Err(e) = result {
            warn!("Failed to remember the selected playlist: {}", e);
        }
    }

    /// Select the playlist after the current one, wrapping around
    pub async fn select_next_playlist(&mut self) -> Result<Option<PlaylistId>> {
        self.step_selection(1).await
    }

    /// Select the playlist before the current one, wrapping around
    pub async fn select_previous_playlist(&mut self) -> Result<Option<PlaylistId>> {
        self.step_selection(-1).await
    }

    async fn step_selection(&mut self, step: isize) -> Result<Option<PlaylistId>> {
        let count = self.playlists.len();
        if count == 0 {
            return Ok(None);
        }

        let index = match self.current.and_then(|id| self.playlists.iter().position(|p| p.id == id)) {
            Some(index) => (index as isize + step).rem_euclid(count as isize) as usize,
            None => 0,
        };
        let id = self.playlists[index].id;
        self.select(Some(id)).await?;
        Ok(Some(id))
    }

    // ===== Songs =====

    /// Append a song unless already present. Returns whether it was added.
    pub fn add_song(&mut self, id: PlaylistId, track: TrackRef) -> Result<bool> {
        let added = self.get_mut(id)?.push_unique(track);
        if added {
            self.schedule_save();
        }
        Ok(added)
    }

    /// Remove a song from one playlist. Returns whether it was present.
    pub fn remove_song(&mut self, id: PlaylistId, track: &TrackRef) -> Result<bool> {
        let removed = self.get_mut(id)?.remove(track);
        if removed {
            self.schedule_save();
        }
        Ok(removed)
    }

    /// Remove a song from every playlist. Returns whether any changed.
    pub fn remove_song_everywhere(&mut self, track: &TrackRef) -> bool {
        self.remove_songs_everywhere(std::slice::from_ref(track))
    }

    /// Remove several songs from every playlist
    pub fn remove_songs_everywhere(&mut self, tracks: &[TrackRef]) -> bool {
        let mut changed = false;
        for playlist in &mut self.playlists {
            let before = playlist.songs.len();
            playlist.songs.retain(|song| !tracks.contains(song));
            changed |= playlist.songs.len() != before;
        }
        if changed {
            self.schedule_save();
        }
        changed
    }

    /// Move the song at `from` so it ends up at index `to`
    pub fn move_song(&mut self, id: PlaylistId, from: usize, to: usize) -> Result<()> {
        let playlist = self.get_mut(id)?;
        let len = playlist.songs.len();
        if from >= len {
            return Err(PlaylistError::IndexOutOfBounds(from));
        }
        if to >= len {
            return Err(PlaylistError::IndexOutOfBounds(to));
        }

        let song = playlist.songs.remove(from);
        playlist.songs.insert(to, song);
        self.schedule_save();
        Ok(())
    }

    /// Replace the song list of a playlist, dropping duplicates
    pub fn update_songs(&mut self, id: PlaylistId, songs: Vec<TrackRef>) -> Result<()> {
        let playlist = self.get_mut(id)?;
        playlist.songs.clear();
        for song in songs {
            playlist.push_unique(song);
        }
        self.schedule_save();
        Ok(())
    }

    // ===== Persistence =====

    fn snapshot(&self) -> Option<serde_json::Value> {
        match serde_json::to_value(&self.playlists) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Failed to serialize playlists: {}", e);
                None
            }
        }
    }

    fn schedule_save(&mut self) {
        if let Some(value) = self.snapshot() {
            self.writer.schedule(value);
        }
    }

    /// Write immediately, trimming user playlists to the newest ones
    ///
    /// Favorites is kept and moved to the front.
    pub async fn save_now(&mut self) -> Result<()> {
        let favorites = self.resolve_favorites_id().await?;

        let mut favorite = None;
        let mut user_lists = Vec::with_capacity(self.playlists.len());
        for playlist in self.playlists.drain(..) {
            if Some(playlist.id) == favorites {
                favorite = Some(playlist);
            } else {
                user_lists.push(playlist);
            }
        }

        let max = self.settings.max_user_playlists;
        if user_lists.len() > max {
            let dropped = user_lists.len() - max;
            warn!("Dropping {} oldest playlists over the limit", dropped);
            user_lists.drain(..dropped);
        }

        self.playlists = favorite.into_iter().chain(user_lists).collect();
        if self.current.is_some_and(|id| self.get(id).is_none()) {
            self.current = None;
        }

        self.flush_pending().await
    }

    /// Cancel any pending debounced save and write the current list now
    pub async fn flush_pending(&mut self) -> Result<()> {
        let value = serde_json::to_value(&self.playlists).map_err(VibriaError::from)?;
        self.writer.flush(value).await?;
        Ok(())
    }

    /// Remove every playlist and the selection, persisting immediately
    pub async fn clear_all(&mut self) -> Result<()> {
        self.playlists.clear();
        self.current = None;
        self.favorites_id = None;
        self.store.remove(KEY_FAVORITES_ID).await?;
        self.store.remove(KEY_LAST_PLAYLIST_ID).await?;
        self.flush_pending().await
    }
}
