//! Key-value backends and key constants
//!
//! Every persisted value lives under one of the flat keys below. Values are
//! JSON documents; tokens inside them are base64 strings.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Access tokens of every imported library track
pub const KEY_LIBRARY_BOOKMARKS: &str = "savedBookmarks";

/// Serialized playlists (Favorites first)
pub const KEY_PLAYLISTS: &str = "vibria_playlists";

/// Id of the Favorites playlist
pub const KEY_FAVORITES_ID: &str = "vibria_favorites_playlist_id";

/// Id of the last selected playlist
pub const KEY_LAST_PLAYLIST_ID: &str = "vibria_last_playlist_id";

/// Access token of the last played track
pub const KEY_LAST_PLAYED_TOKEN: &str = "lastPlayedURLBookmark";

/// Position of the last played track, in seconds
pub const KEY_LAST_PLAYED_TIME: &str = "lastPlayedTime";

/// Track keys with saved progress, least recently saved first
pub const KEY_PROGRESS_LIST: &str = "progressKeysList";

/// Prefix of per-track progress entries
pub const PROGRESS_KEY_PREFIX: &str = "progress-";

/// Shuffle preference
pub const KEY_SHUFFLE: &str = "vibria_isShuffling";

/// Loop mode preference (integer)
pub const KEY_LOOP_MODE: &str = "vibria_loopMode";

/// Restore the last selected playlist at launch
pub const KEY_RESUME_LAST_PLAYLIST: &str = "resumeLastPlaylist";

/// Restore the last played track and position at launch
pub const KEY_RESUME_PLAYBACK: &str = "resumePlayback";

/// Storage key of the progress entry for `track_key`
pub fn progress_key(track_key: &str) -> String {
    format!("{PROGRESS_KEY_PREFIX}{track_key}")
}
