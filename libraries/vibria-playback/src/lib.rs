//! Vibria Player - Playback Management
//!
//! Queue, shuffle/loop and playback session management for Vibria.
//!
//! This crate provides:
//! - Active queue over the library or the selected playlist
//! - Shuffle (materialized permutation) and loop modes (Off, Single, All)
//! - Single-session engine adapter with file access scopes
//! - Resume positions, last played track and library bookmarks
//! - Launch restore, background flush and hard mute paths
//!
//! # Architecture
//!
//! Audio decoding and output are platform concerns, provided through the
//! [`AudioEngine`] trait. Engines report ticks, track ends and seek results
//! on a channel; the [`PlaybackManager`] applies them on its own task and
//! ignores events from sessions it has already replaced.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vibria_core::{LocalFileAccess, TrackRef};
//! use vibria_playback::{AudioEngine, PlaybackConfig, PlaybackManager};
//! use vibria_storage::MemoryStore;
//!
//! # async fn example(engine: Box<dyn AudioEngine>) -> vibria_playback::Result<()> {
//! let mut manager = PlaybackManager::open(
//!     engine,
//!     Arc::new(LocalFileAccess::new()),
//!     Arc::new(MemoryStore::new()),
//!     PlaybackConfig::default(),
//! )
//! .await?;
//!
//! manager.restore_session().await?;
//! manager.set_library(vec![TrackRef::from("/music/intro.mp3")]);
//! manager.select(TrackRef::from("/music/intro.mp3"))?;
//!
//! while let Some(event) = manager.next_engine_event().await {
//!     manager.handle_engine_event(event).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod events;
pub mod manager;
pub mod queue;
pub mod shuffle;
pub mod types;

pub use engine::{
    AudioEngine, EngineAdapter, EngineEvent, EngineEventKind, EngineEventSink, SessionCategory,
    SessionId,
};
pub use error::{PlaybackError, Result};
pub use events::PlayerEvent;
pub use manager::PlaybackManager;
pub use queue::ActiveQueue;
pub use types::{PlaybackConfig, SessionSnapshot, DEFAULT_LIBRARY_DEBOUNCE, UNKNOWN_DURATION};
