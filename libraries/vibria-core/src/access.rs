//! File access abstraction
//!
//! Tracks live outside the application and may need platform permission to
//! read. [`FileAccess`] grants that permission as an [`AccessScope`] guard and
//! turns tracks into persistable [`AccessToken`]s that can restore access on a
//! later launch.

use crate::error::{Result, VibriaError};
use crate::types::TrackRef;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Persistable handle that restores access to a track across launches
///
/// Serialized as a base64 string.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(Vec<u8>);

impl AccessToken {
    /// Wrap raw token bytes
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Raw token bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({} bytes)", self.0.len())
    }
}

impl Serialize for AccessToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for AccessToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// Open access grant for one track, released on drop
pub struct AccessScope {
    track: TrackRef,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl AccessScope {
    /// Scope that runs `release` when dropped
    pub fn new(track: TrackRef, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            track,
            release: Some(Box::new(release)),
        }
    }

    /// Scope for files that need no explicit grant
    pub fn unrestricted(track: TrackRef) -> Self {
        Self {
            track,
            release: None,
        }
    }

    /// Track this scope grants access to
    pub fn track(&self) -> &TrackRef {
        &self.track
    }
}

impl fmt::Debug for AccessScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessScope")
            .field("track", &self.track)
            .finish_non_exhaustive()
    }
}

impl Drop for AccessScope {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Platform file-access service
pub trait FileAccess: Send + Sync {
    /// Whether the track exists and is a regular file
    fn is_available(&self, track: &TrackRef) -> bool;

    /// Open an access scope for reading the track
    ///
    /// # Errors
    /// Returns an error if access cannot be granted
    fn open_scope(&self, track: &TrackRef) -> Result<AccessScope>;

    /// Create a persistable token for the track
    ///
    /// # Errors
    /// Returns an error if the platform refuses to bookmark the file
    fn create_token(&self, track: &TrackRef) -> Result<AccessToken>;

    /// Resolve a previously created token back into a track
    ///
    /// # Errors
    /// Returns an error if the token is corrupt or its file is gone
    fn resolve_token(&self, token: &AccessToken) -> Result<TrackRef>;
}

/// [`FileAccess`] over the plain local filesystem
///
/// Tokens are the UTF-8 path bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileAccess;

impl LocalFileAccess {
    /// Create a local file access service
    pub fn new() -> Self {
        Self
    }
}

impl FileAccess for LocalFileAccess {
    fn is_available(&self, track: &TrackRef) -> bool {
        track.path().is_file()
    }

    fn open_scope(&self, track: &TrackRef) -> Result<AccessScope> {
        if !self.is_available(track) {
            return Err(VibriaError::access(format!("{track} is not readable")));
        }
        Ok(AccessScope::unrestricted(track.clone()))
    }

    fn create_token(&self, track: &TrackRef) -> Result<AccessToken> {
        let path = track
            .path()
            .to_str()
            .ok_or_else(|| VibriaError::invalid_input(format!("non UTF-8 path: {track}")))?;
        Ok(AccessToken::from_bytes(path.as_bytes()))
    }

    fn resolve_token(&self, token: &AccessToken) -> Result<TrackRef> {
        let path = std::str::from_utf8(token.as_bytes())
            .map_err(|e| VibriaError::access(format!("corrupt token: {e}")))?;
        let track = TrackRef::from(path);
        if !self.is_available(&track) {
            return Err(VibriaError::not_found("file", path));
        }
        Ok(track)
    }
}
