/// Playlist domain types
use crate::types::TrackRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Playlist identifier, immutable once created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(Uuid);

impl PlaylistId {
    /// Generate a new random playlist ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the inner UUID
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlaylistId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Named, ordered list of tracks
///
/// Songs are deduplicated on insert. The name is unique among playlists,
/// compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Unique playlist identifier
    pub id: PlaylistId,

    /// Display name
    pub name: String,

    /// Ordered tracks
    pub songs: Vec<TrackRef>,
}

impl Playlist {
    /// Create an empty playlist with a fresh ID
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlaylistId::generate(),
            name: name.into(),
            songs: Vec::new(),
        }
    }

    /// Whether the playlist contains the track
    pub fn contains(&self, track: &TrackRef) -> bool {
        self.songs.contains(track)
    }

    /// Append a track unless already present. Returns whether it was added.
    pub fn push_unique(&mut self, track: TrackRef) -> bool {
        if self.contains(&track) {
            return false;
        }
        self.songs.push(track);
        true
    }

    /// Remove every occurrence of the track. Returns whether anything changed.
    pub fn remove(&mut self, track: &TrackRef) -> bool {
        let before = self.songs.len();
        self.songs.retain(|song| song != track);
        self.songs.len() != before
    }

    /// Whether `name` matches this playlist's name ignoring case
    pub fn has_name_ignoring_case(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}
