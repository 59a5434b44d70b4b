//! Error types for playback management

use thiserror::Error;
use vibria_core::{TrackRef, VibriaError};
use vibria_storage::PlaylistError;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Track is missing, a directory, or no longer accessible
    #[error("Track unavailable: {0}")]
    TrackUnavailable(TrackRef),

    /// No track is selected
    #[error("No track selected")]
    NoSelection,

    /// Audio engine failure
    #[error("Engine error: {0}")]
    Engine(String),

    /// Playlist operation failed
    #[error(transparent)]
    Playlist(#[from] PlaylistError),

    /// Persistence failure
    #[error(transparent)]
    Storage(#[from] VibriaError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
