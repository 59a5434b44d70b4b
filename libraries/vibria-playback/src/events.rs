//! Player events
//!
//! The manager broadcasts these to any number of observers (UI, remote
//! controls, the CLI). Events are emitted at key points:
//! - Selection changes
//! - Play state changes
//! - Position updates (on every engine tick)
//! - Queue, library and playlist changes
//! - Rejected imports and unavailable tracks

use serde::{Deserialize, Serialize};
use vibria_core::{LoopMode, PlaylistId, TrackRef};

/// Events emitted by the playback manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// Selected track changed (may be set without autoplay)
    SelectedTrackChanged { track: Option<TrackRef> },

    /// Playing flag changed
    StateChanged { is_playing: bool },

    /// Elapsed/duration changed
    PositionChanged { elapsed: f64, duration: f64 },

    /// A seek finished and elapsed is authoritative again
    SeekCompleted { position: f64 },

    /// Active order changed (base, shuffle or removal)
    QueueChanged { len: usize, shuffled: bool },

    /// Loop mode changed
    LoopModeChanged { mode: LoopMode },

    /// Library contents changed
    LibraryChanged { len: usize },

    /// Playlist list or selection changed
    PlaylistsChanged { current: Option<PlaylistId> },

    /// Imported files with an unsupported extension, never queued
    UnsupportedFiles { tracks: Vec<TrackRef> },

    /// Selection attempt dropped because the file is gone or inaccessible
    TrackUnavailable { track: TrackRef },
}
