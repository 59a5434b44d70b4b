//! Playback manager - core orchestration
//!
//! Coordinates the library, the active queue, the engine session and the
//! persistence of progress, last played position and library bookmarks.
//!
//! The manager is driven from a single task through `&mut self`. Engine
//! events are delivered with [`PlaybackManager::handle_engine_event`] or
//! drained with [`PlaybackManager::pump_engine_events`].

mod lifecycle;
mod playlists;

use crate::{
    engine::{AudioEngine, EngineAdapter, EngineEvent, EngineEventKind},
    error::{PlaybackError, Result},
    events::PlayerEvent,
    queue::ActiveQueue,
    types::{sanitize_duration, PlaybackConfig, SessionSnapshot},
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use vibria_core::{
    partition_supported, FileAccess, KeyValueStore, LoopMode, NowPlaying, Playlist, TrackRef,
};
use vibria_storage::{
    store::KEY_LIBRARY_BOOKMARKS, BookmarkStore, DebouncedWriter, LastPlayedStore,
    OverlayCoordinator, PlaylistStore, Preferences, ProgressStore,
};

/// Capacity of the event broadcast channel
const EVENT_CAPACITY: usize = 256;

/// Duration shown between a load and the first engine tick
const PLACEHOLDER_DURATION: f64 = 1.0;

/// Queue and playback session manager
pub struct PlaybackManager {
    engine: EngineAdapter,
    access: Arc<dyn FileAccess>,

    // Persistence
    playlists: PlaylistStore,
    progress: ProgressStore,
    last_played: LastPlayedStore,
    bookmarks: BookmarkStore,
    preferences: Preferences,
    library_writer: DebouncedWriter,
    overlay: OverlayCoordinator,

    // Queue
    library: Vec<TrackRef>,
    queue: ActiveQueue,

    // Session
    selected: Option<TrackRef>,
    elapsed: f64,
    duration: f64,
    is_playing: bool,
    loop_mode: LoopMode,
    /// Target of the seek in flight; ticks leave `elapsed` alone meanwhile
    seek_target: Option<f64>,

    /// Set while a boot restore runs so an empty library is not written
    suppress_empty_library_saves: bool,

    events: broadcast::Sender<PlayerEvent>,
}

impl PlaybackManager {
    /// Build a manager over `store`, loading playlists and playback modes
    pub async fn open(
        engine: Box<dyn AudioEngine>,
        access: Arc<dyn FileAccess>,
        store: Arc<dyn KeyValueStore>,
        config: PlaybackConfig,
    ) -> Result<Self> {
        let overlay = OverlayCoordinator::new(config.overlay_min_visible);

        let mut playlists =
            PlaylistStore::new(store.clone(), overlay.clone(), config.playlist_settings());
        playlists.load().await?;

        let preferences = Preferences::new(store.clone());
        let mut queue = ActiveQueue::new();
        queue.set_shuffle(preferences.shuffle().await?);
        let loop_mode = preferences.loop_mode().await?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        info!(
            "Playback manager ready (shuffle: {}, loop: {:?})",
            queue.is_shuffled(),
            loop_mode
        );

        Ok(Self {
            engine: EngineAdapter::new(engine, access.clone()),
            progress: ProgressStore::with_limits(
                store.clone(),
                config.progress_threshold_secs,
                config.max_progress_entries,
            ),
            last_played: LastPlayedStore::new(store.clone(), access.clone()),
            bookmarks: BookmarkStore::new(store.clone(), access.clone()),
            library_writer: DebouncedWriter::new(
                KEY_LIBRARY_BOOKMARKS,
                config.library_debounce,
                store,
                overlay.clone(),
            ),
            access,
            playlists,
            preferences,
            overlay,
            library: Vec::new(),
            queue,
            selected: None,
            elapsed: 0.0,
            duration: 0.0,
            is_playing: false,
            loop_mode,
            seek_target: None,
            suppress_empty_library_saves: false,
            events,
        })
    }

    /// Observe player events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: PlayerEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    // ===== State Queries =====

    pub fn selected(&self) -> Option<&TrackRef> {
        self.selected.as_ref()
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_shuffling(&self) -> bool {
        self.queue.is_shuffled()
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn is_seeking(&self) -> bool {
        self.seek_target.is_some()
    }

    pub fn library(&self) -> &[TrackRef] {
        &self.library
    }

    pub fn active_queue(&self) -> &ActiveQueue {
        &self.queue
    }

    /// Playlist collection (read-only; mutate through the manager)
    pub fn playlists(&self) -> &PlaylistStore {
        &self.playlists
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Saving indicator shared by all writers
    pub fn overlay(&self) -> &OverlayCoordinator {
        &self.overlay
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            selected: self.selected.clone(),
            elapsed: self.elapsed,
            duration: self.duration,
            is_playing: self.is_playing,
            is_shuffling: self.queue.is_shuffled(),
            loop_mode: self.loop_mode,
            seek_in_flight: self.seek_target.is_some(),
        }
    }

    // ===== Library =====

    /// Replace the library
    ///
    /// Unsupported files are reported and dropped. The active queue is
    /// rebuilt from the current playlist or the new library and the library
    /// bookmarks are saved after the quiet period.
    pub fn set_library(&mut self, tracks: Vec<TrackRef>) {
        let (supported, unsupported) = partition_supported(tracks);
        self.report_unsupported(unsupported);

        self.library = supported;
        info!("Library set to {} tracks", self.library.len());
        self.emit(PlayerEvent::LibraryChanged {
            len: self.library.len(),
        });

        self.schedule_library_save();
        self.resync_queue();
    }

    /// Merge new tracks into the library
    ///
    /// Tracks already in the library are skipped. With a playlist selected
    /// the tracks are added to it as well. Returns the number of tracks new
    /// to the library.
    pub async fn import_tracks(&mut self, tracks: Vec<TrackRef>) -> Result<usize> {
        let (supported, unsupported) = partition_supported(tracks);
        self.report_unsupported(unsupported);

        let mut merged = self.library.clone();
        let mut added = 0;
        for track in &supported {
            if !merged.contains(track) {
                merged.push(track.clone());
                added += 1;
            }
        }

        if let Some(current) = self.playlists.current_id() {
            let favorites = self.playlists.favorites().map(|p| p.id);
            for track in supported {
                if favorites == Some(current) {
                    self.playlists.add_to_favorites(track).await?;
                } else {
                    self.playlists.add_song(current, track)?;
                }
            }
            self.emit(PlayerEvent::PlaylistsChanged {
                current: Some(current),
            });
        }

        debug!("Imported {} new tracks", added);
        self.set_library(merged);
        Ok(added)
    }

    fn report_unsupported(&self, unsupported: Vec<TrackRef>) {
        if unsupported.is_empty() {
            return;
        }
        warn!("Ignoring {} unsupported files", unsupported.len());
        self.emit(PlayerEvent::UnsupportedFiles {
            tracks: unsupported,
        });
    }

    fn schedule_library_save(&mut self) {
        if self.library.is_empty() && self.suppress_empty_library_saves {
            debug!("Not saving an empty library during restore");
            return;
        }
        let tokens = self.bookmarks.tokens_for(&self.library);
        match serde_json::to_value(tokens) {
            Ok(value) => self.library_writer.schedule(value),
            Err(e) => warn!("Failed to serialize library bookmarks: {}", e),
        }
    }

    // ===== Queue =====

    /// Make `playlist` (or the library for `None`) the queue base
    ///
    /// A selection missing from the new base is replaced by its first track,
    /// loaded paused, or cleared when the base is empty.
    pub fn set_active_queue(&mut self, playlist: Option<&Playlist>) {
        let base = playlist.map_or_else(|| self.library.clone(), |p| p.songs.clone());
        self.apply_base(base);
    }

    /// Rebuild the queue from the current playlist or the library
    fn resync_queue(&mut self) {
        let base = match self.playlists.current() {
            Some(playlist) => playlist.songs.clone(),
            None => self.library.clone(),
        };
        self.apply_base(base);
    }

    fn apply_base(&mut self, base: Vec<TrackRef>) {
        self.queue.set_base(base);
        self.emit_queue_changed();

        if self
            .selected
            .as_ref()
            .is_some_and(|track| self.queue.contains(track))
        {
            return;
        }

        match self.queue.first().cloned() {
            Some(first) => self.load_paused(first, None),
            None => {
                self.stop();
                self.set_selected(None);
            }
        }
    }

    fn emit_queue_changed(&self) {
        self.emit(PlayerEvent::QueueChanged {
            len: self.queue.len(),
            shuffled: self.queue.is_shuffled(),
        });
    }

    /// Remove a track from the library, the queue and every playlist
    ///
    /// If it was selected, playback stops and the first track of the queue is
    /// loaded paused.
    pub fn remove_track(&mut self, track: &TrackRef) {
        let was_selected = self.selected.as_ref() == Some(track);

        let before = self.library.len();
        self.library.retain(|t| t != track);
        if self.library.len() != before {
            self.emit(PlayerEvent::LibraryChanged {
                len: self.library.len(),
            });
            self.schedule_library_save();
        }

        if self.queue.remove(track) {
            self.emit_queue_changed();
        }

        if self.playlists.remove_song_everywhere(track) {
            self.emit(PlayerEvent::PlaylistsChanged {
                current: self.playlists.current_id(),
            });
        }

        info!("Removed {}", track);

        if was_selected {
            self.stop();
            match self.queue.first().cloned() {
                Some(first) => self.load_paused(first, None),
                None => self.set_selected(None),
            }
        }
    }

    // ===== Playback Control =====

    /// Select a track and start playing it
    ///
    /// # Errors
    /// `TrackUnavailable` if the file is gone; state is left untouched.
    pub fn select(&mut self, track: TrackRef) -> Result<()> {
        self.ensure_available(&track)?;
        self.set_selected(Some(track.clone()));
        self.start_playback(&track, None, true)
    }

    /// Select a track and load it paused at `at` seconds
    pub fn select_without_playing(&mut self, track: TrackRef, at: Option<f64>) -> Result<()> {
        self.ensure_available(&track)?;
        self.set_selected(Some(track.clone()));
        let result = self.start_playback(&track, at, false);
        self.set_playing(false);
        result
    }

    fn ensure_available(&self, track: &TrackRef) -> Result<()> {
        if self.access.is_available(track) {
            return Ok(());
        }
        warn!("Track unavailable: {}", track);
        self.emit(PlayerEvent::TrackUnavailable {
            track: track.clone(),
        });
        Err(PlaybackError::TrackUnavailable(track.clone()))
    }

    /// Selection fallback used after queue changes; failures are only logged
    fn load_paused(&mut self, track: TrackRef, at: Option<f64>) {
        self.set_selected(Some(track.clone()));
        if let Err(e) = self.start_playback(&track, at, false) {
            warn!("Could not load {}: {}", track, e);
        }
        self.set_playing(false);
    }

    fn start_playback(&mut self, track: &TrackRef, at: Option<f64>, autoplay: bool) -> Result<()> {
        self.engine.set_now_playing(None);
        self.seek_target = None;
        self.elapsed = at.filter(|at| at.is_finite() && *at > 0.0).unwrap_or(0.0);
        self.duration = PLACEHOLDER_DURATION;

        if let Err(e) = self.engine.start(track, at, autoplay) {
            error!("Playback of {} failed: {}", track, e);
            self.set_playing(false);
            self.emit_position();
            return Err(PlaybackError::Engine(e.to_string()));
        }

        self.set_playing(autoplay);
        self.update_now_playing();
        self.emit_position();
        Ok(())
    }

    /// Resume playback, loading the selection if no session exists
    pub fn play(&mut self) -> Result<()> {
        if self.engine.play() {
            self.set_playing(true);
            self.update_now_playing();
            return Ok(());
        }
        let track = self.selected.clone().ok_or(PlaybackError::NoSelection)?;
        let at = self.elapsed;
        self.start_playback(&track, Some(at), true)
    }

    pub fn pause(&mut self) {
        if self.engine.pause() {
            self.set_playing(false);
            self.update_now_playing();
        }
    }

    pub fn toggle_play_pause(&mut self) -> Result<()> {
        if self.is_playing && self.engine.has_session() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Skip to the next track of the play order, wrapping around
    pub fn next(&mut self) -> Result<()> {
        let next = self
            .selected
            .as_ref()
            .and_then(|current| self.queue.next_after(current))
            .cloned();
        match next {
            Some(track) => self.select(track),
            None => Ok(()),
        }
    }

    /// Go back to the previous track of the play order, wrapping around
    pub fn previous(&mut self) -> Result<()> {
        let previous = self
            .selected
            .as_ref()
            .and_then(|current| self.queue.previous_before(current))
            .cloned();
        match previous {
            Some(track) => self.select(track),
            None => Ok(()),
        }
    }

    /// Request a seek; `elapsed` follows the target until the engine confirms
    pub fn seek(&mut self, to_seconds: f64) -> Result<()> {
        let target = to_seconds.max(0.0);
        self.seek_target = Some(target);
        if let Err(e) = self.engine.seek(target) {
            self.seek_target = None;
            warn!("Seek to {:.1}s failed: {}", target, e);
            return Err(PlaybackError::Engine(e.to_string()));
        }
        self.elapsed = target;
        self.emit_position();
        Ok(())
    }

    /// Tear down the session; the selection is kept
    pub fn stop(&mut self) {
        self.engine.stop();
        self.seek_target = None;
        self.set_playing(false);
        self.elapsed = 0.0;
        self.duration = 0.0;
        self.emit_position();
    }

    // ===== Shuffle & Loop =====

    /// Enable (fresh permutation) or disable shuffle
    pub async fn set_shuffle(&mut self, enabled: bool) -> Result<()> {
        self.queue.set_shuffle(enabled);
        self.emit_queue_changed();
        self.preferences.set_shuffle(enabled).await?;
        Ok(())
    }

    pub async fn toggle_shuffle(&mut self) -> Result<bool> {
        let enabled = !self.queue.is_shuffled();
        self.set_shuffle(enabled).await?;
        Ok(enabled)
    }

    pub async fn set_loop_mode(&mut self, mode: LoopMode) -> Result<()> {
        self.loop_mode = mode;
        self.emit(PlayerEvent::LoopModeChanged { mode });
        self.preferences.set_loop_mode(mode).await?;
        Ok(())
    }

    /// Off -> Single -> All -> Off
    pub async fn cycle_loop_mode(&mut self) -> Result<LoopMode> {
        let mode = self.loop_mode.cycle();
        self.set_loop_mode(mode).await?;
        Ok(mode)
    }

    // ===== Engine Events =====

    /// Apply one engine event; events of a replaced session are ignored
    pub async fn handle_engine_event(&mut self, event: EngineEvent) -> Result<()> {
        if !self.engine.is_current(&event) {
            debug!("Ignoring event from stale session {}", event.session);
            return Ok(());
        }

        match event.kind {
            EngineEventKind::Position {
                elapsed,
                duration,
                rate,
            } => {
                self.handle_tick(elapsed, duration, rate).await;
                Ok(())
            }
            EngineEventKind::Finished => self.handle_track_finished().await,
            EngineEventKind::SeekCompleted { target } => {
                self.seek_target = None;
                self.elapsed = target;
                self.emit(PlayerEvent::SeekCompleted { position: target });
                self.emit_position();
                Ok(())
            }
            EngineEventKind::Failed { message } => {
                error!("Engine failure: {}", message);
                self.set_playing(false);
                self.update_now_playing();
                Ok(())
            }
        }
    }

    /// Apply every queued engine event. Returns how many were handled.
    pub async fn pump_engine_events(&mut self) -> Result<usize> {
        let mut handled = 0;
        while let Some(event) = self.engine.try_next_event() {
            self.handle_engine_event(event).await?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Wait for the next engine event, to be passed to `handle_engine_event`
    pub async fn next_engine_event(&mut self) -> Option<EngineEvent> {
        self.engine.next_event().await
    }

    /// Id of the live engine session
    pub fn current_session(&self) -> Option<crate::engine::SessionId> {
        self.engine.current_session()
    }

    async fn handle_tick(&mut self, elapsed: f64, duration: f64, rate: f64) {
        let Some(track) = self.selected.clone() else {
            return;
        };

        self.duration = sanitize_duration(duration);
        if self.seek_target.is_none() {
            self.elapsed = if elapsed.is_finite() {
                elapsed.clamp(0.0, self.duration)
            } else {
                0.0
            };

            if let Err(e) = self
                .progress
                .save_if_needed(&track.file_name(), self.elapsed)
                .await
            {
                warn!("Failed to save progress for {}: {}", track, e);
            }
            if let Err(e) = self.last_played.save(&track, self.elapsed).await {
                warn!("Failed to save last played: {}", e);
            }
        }

        self.set_playing(rate != 0.0);
        self.update_now_playing();
        self.emit_position();
    }

    async fn handle_track_finished(&mut self) -> Result<()> {
        let Some(current) = self.selected.clone() else {
            return Ok(());
        };
        debug!("Finished {} (loop: {:?})", current, self.loop_mode);

        let advanced = match self.loop_mode {
            LoopMode::Off => match self.queue.following(&current).cloned() {
                Some(next) => self.select(next),
                None => {
                    self.set_playing(false);
                    self.update_now_playing();
                    return Ok(());
                }
            },
            LoopMode::Single => {
                if let Err(e) = self.progress.clear(&current.file_name()).await {
                    warn!("Failed to clear progress for {}: {}", current, e);
                }
                self.start_playback(&current, None, true)
            }
            LoopMode::All => self.next(),
        };

        // A failed advance leaves the finished item stopped
        if let Err(e) = advanced {
            warn!("Could not continue after {}: {}", current, e);
            self.set_playing(false);
            self.update_now_playing();
        }
        Ok(())
    }

    // ===== Internal State =====

    fn set_selected(&mut self, track: Option<TrackRef>) {
        if self.selected == track {
            return;
        }
        self.selected = track.clone();
        self.emit(PlayerEvent::SelectedTrackChanged { track });
    }

    fn set_playing(&mut self, playing: bool) {
        if self.is_playing == playing {
            return;
        }
        self.is_playing = playing;
        self.emit(PlayerEvent::StateChanged {
            is_playing: playing,
        });
    }

    fn emit_position(&self) {
        self.emit(PlayerEvent::PositionChanged {
            elapsed: self.elapsed,
            duration: self.duration,
        });
    }

    fn update_now_playing(&mut self) {
        let Some(track) = self.selected.as_ref() else {
            self.engine.set_now_playing(None);
            return;
        };
        let info = NowPlaying {
            title: track.title(),
            elapsed: self.elapsed,
            duration: self.duration,
            rate: if self.is_playing { 1.0 } else { 0.0 },
        };
        self.engine.set_now_playing(Some(&info));
    }
}
