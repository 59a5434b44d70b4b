/// Track reference types
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// File extensions the audio engine can decode (lowercase, without dot)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "m4a", "aac", "wav", "aiff", "aif", "caf"];

/// Opaque locator for a local audio file
///
/// Identity is path equality. A reference is only usable for I/O while an
/// [`AccessScope`](crate::AccessScope) for it is open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackRef(PathBuf);

impl TrackRef {
    /// Create a track reference from a path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Underlying file path
    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Last path component, used as the key for per-track progress
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.to_string_lossy().into_owned())
    }

    /// File name without extension, used as the now-playing title
    pub fn title(&self) -> String {
        self.0
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name())
    }

    /// Lowercased extension, if any
    pub fn extension(&self) -> Option<String> {
        self.0
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    /// Whether the extension is in [`SUPPORTED_EXTENSIONS`]
    pub fn is_supported(&self) -> bool {
        self.extension()
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for TrackRef {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&str> for TrackRef {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

/// Split tracks into (supported, unsupported) by extension, preserving order
pub fn partition_supported(tracks: Vec<TrackRef>) -> (Vec<TrackRef>, Vec<TrackRef>) {
    tracks.into_iter().partition(TrackRef::is_supported)
}
