//! Vibria Core
//!
//! Platform-agnostic types, traits, and error handling for the Vibria player.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `TrackRef`, `Playlist`, `PlaylistId`, `LoopMode`
//! - **Platform Traits**: `FileAccess` (permission scopes and persistable
//!   tokens) and `KeyValueStore` (flat JSON persistence)
//! - **Error Handling**: Unified `VibriaError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use vibria_core::types::{Playlist, TrackRef};
//!
//! let mut gym = Playlist::new("Gym");
//! gym.push_unique(TrackRef::from("/music/warmup.mp3"));
//! assert!(gym.contains(&TrackRef::from("/music/warmup.mp3")));
//! ```

#![forbid(unsafe_code)]

pub mod access;
pub mod error;
pub mod storage;
pub mod types;

pub use access::{AccessScope, AccessToken, FileAccess, LocalFileAccess};
pub use error::{Result, VibriaError};
pub use storage::KeyValueStore;

pub use types::{
    partition_supported, LoopMode, NowPlaying, Playlist, PlaylistId, TrackRef,
    SUPPORTED_EXTENSIONS,
};
