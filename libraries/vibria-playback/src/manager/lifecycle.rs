//! Launch, background and teardown paths

use super::PlaybackManager;
use crate::error::Result;
use crate::events::PlayerEvent;
use crate::queue::ActiveQueue;
use tracing::{debug, info, warn};
use vibria_core::{partition_supported, LoopMode};

impl PlaybackManager {
    /// Rebuild the session from persisted state at launch
    ///
    /// Restores the library from its bookmarks, picks the current playlist
    /// (when resuming it is enabled and it has songs) or the library as the
    /// queue, then selects the last played track paused at its saved
    /// position. Falls back to the first track of the queue.
    pub async fn restore_session(&mut self) -> Result<()> {
        self.suppress_empty_library_saves = true;
        let result = self.restore_inner().await;
        self.suppress_empty_library_saves = false;
        result
    }

    async fn restore_inner(&mut self) -> Result<()> {
        let restored = self.bookmarks.load().await?;
        if !restored.is_empty() {
            let (supported, unsupported) = partition_supported(restored);
            if !unsupported.is_empty() {
                warn!("Dropping {} unsupported bookmarked files", unsupported.len());
            }
            self.library = supported;
            self.emit(PlayerEvent::LibraryChanged {
                len: self.library.len(),
            });
        }

        let resume_playlist = self.preferences.resume_last_playlist().await?;
        let initial = match self.playlists.current() {
            Some(playlist) if resume_playlist && !playlist.songs.is_empty() => {
                debug!("Resuming playlist {}", playlist.name);
                Some(playlist.songs.clone())
            }
            _ => None,
        };
        let initial = match initial {
            Some(songs) => songs,
            None => {
                if self.playlists.current_id().is_some() {
                    self.playlists.select(None).await?;
                    self.emit(PlayerEvent::PlaylistsChanged { current: None });
                }
                self.library.clone()
            }
        };
        self.queue.set_base(initial);
        self.emit_queue_changed();

        let last = if self.preferences.resume_playback().await? {
            self.last_played.load().await.unwrap_or_else(|e| {
                warn!("Last played track unavailable: {}", e);
                None
            })
        } else {
            None
        };
        let resume = last.and_then(|(track, at)| {
            let name = track.file_name();
            self.queue
                .base()
                .iter()
                .find(|t| t.file_name() == name)
                .cloned()
                .map(|found| (found, at))
        });

        match resume {
            Some((track, at)) => {
                info!("Resuming {} at {:.1}s", track, at);
                if let Err(e) = self.select_without_playing(track.clone(), Some(at)) {
                    warn!("Could not resume {}: {}", track, e);
                }
            }
            None => match self.queue.first().cloned() {
                Some(first) => self.load_paused(first, None),
                None => self.set_selected(None),
            },
        }

        info!(
            "Session restored: {} library tracks, queue of {}",
            self.library.len(),
            self.queue.len()
        );
        Ok(())
    }

    /// Write pending playlist and library saves now
    ///
    /// Called when the app moves to the background or becomes inactive.
    pub async fn flush_pending_saves(&mut self) -> Result<()> {
        self.playlists.flush_pending().await?;
        self.flush_library().await
    }

    async fn flush_library(&mut self) -> Result<()> {
        if self.library.is_empty() && self.suppress_empty_library_saves {
            return Ok(());
        }
        let tokens = self.bookmarks.tokens_for(&self.library);
        let value = serde_json::to_value(tokens).map_err(vibria_core::VibriaError::from)?;

        self.overlay.show();
        let result = self.library_writer.flush(value).await;
        self.overlay.hide();
        result?;
        debug!("Flushed {} library bookmarks", self.library.len());
        Ok(())
    }

    /// Silence playback for process teardown; the selection is kept
    pub fn hard_stop_and_silence(&mut self) {
        self.seek_target = None;
        self.engine.hard_stop_and_silence();
        self.set_playing(false);
        self.elapsed = 0.0;
        self.duration = 0.0;
        self.emit_position();
    }

    /// Forget everything persisted and return to an empty player
    pub async fn reset_all(&mut self) -> Result<()> {
        self.stop();
        self.library_writer.cancel();

        self.playlists.clear_all().await?;
        self.bookmarks.clear().await?;
        self.progress.clear_all().await?;
        self.last_played.clear().await?;
        self.preferences.clear_playback_modes().await?;

        self.library.clear();
        self.queue = ActiveQueue::new();
        self.loop_mode = LoopMode::Off;
        self.set_selected(None);

        self.emit(PlayerEvent::LibraryChanged { len: 0 });
        self.emit_queue_changed();
        self.emit(PlayerEvent::LoopModeChanged {
            mode: LoopMode::Off,
        });
        self.emit(PlayerEvent::PlaylistsChanged { current: None });
        info!("All player state reset");
        Ok(())
    }
}
