//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::time::Duration;
use vibria_core::{LoopMode, TrackRef};
use vibria_storage::overlay::DEFAULT_MIN_VISIBLE;
use vibria_storage::playlists::{DEFAULT_MAX_USER_PLAYLISTS, DEFAULT_PLAYLIST_DEBOUNCE};
use vibria_storage::progress::{DEFAULT_MAX_PROGRESS_ENTRIES, DEFAULT_PROGRESS_THRESHOLD_SECS};
use vibria_storage::PlaylistSettings;

/// Quiet period before the library bookmarks are written
pub const DEFAULT_LIBRARY_DEBOUNCE: Duration = Duration::from_secs(1);

/// Duration reported while the engine does not know the real one
pub const UNKNOWN_DURATION: f64 = 0.001;

/// Playback configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    /// Minimal progress delta (seconds) between two writes (default: 5.0)
    pub progress_threshold_secs: f64,

    /// Maximum number of tracks with a saved position (default: 200)
    pub max_progress_entries: usize,

    /// Quiet period for playlist saves (default: 600ms)
    pub playlist_debounce: Duration,

    /// Quiet period for library bookmark saves (default: 1s)
    pub library_debounce: Duration,

    /// Minimum time the saving indicator stays up (default: 1s)
    pub overlay_min_visible: Duration,

    /// Maximum number of user playlists, Favorites excluded (default: 10)
    pub max_user_playlists: usize,
}

impl PlaybackConfig {
    pub(crate) fn playlist_settings(&self) -> PlaylistSettings {
        PlaylistSettings {
            max_user_playlists: self.max_user_playlists,
            debounce: self.playlist_debounce,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            progress_threshold_secs: DEFAULT_PROGRESS_THRESHOLD_SECS,
            max_progress_entries: DEFAULT_MAX_PROGRESS_ENTRIES,
            playlist_debounce: DEFAULT_PLAYLIST_DEBOUNCE,
            library_debounce: DEFAULT_LIBRARY_DEBOUNCE,
            overlay_min_visible: DEFAULT_MIN_VISIBLE,
            max_user_playlists: DEFAULT_MAX_USER_PLAYLISTS,
        }
    }
}

/// Point-in-time view of the playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub selected: Option<TrackRef>,
    pub elapsed: f64,
    pub duration: f64,
    pub is_playing: bool,
    pub is_shuffling: bool,
    pub loop_mode: LoopMode,
    /// Elapsed is provisional while a seek is in flight
    pub seek_in_flight: bool,
}

/// Clamp an engine-reported duration to something displayable
pub(crate) fn sanitize_duration(raw: f64) -> f64 {
    if raw.is_finite() && raw > 0.0 {
        raw
    } else {
        UNKNOWN_DURATION
    }
}
