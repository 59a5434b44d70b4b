//! Per-track playback progress
//!
//! Positions are written only when they moved more than the threshold since
//! the last write for that track, and at most `max_entries` tracks keep a
//! saved position (least recently saved evicted first).

use crate::store::{progress_key, KEY_PROGRESS_LIST};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use vibria_core::storage::{get_typed, set_typed};
use vibria_core::{KeyValueStore, Result};

/// Minimal delta in seconds between two writes for the same track
pub const DEFAULT_PROGRESS_THRESHOLD_SECS: f64 = 5.0;

/// Maximum number of tracks with a saved position
pub const DEFAULT_MAX_PROGRESS_ENTRIES: usize = 200;

/// Resumable positions keyed by track key
pub struct ProgressStore {
    store: Arc<dyn KeyValueStore>,
    threshold: f64,
    max_entries: usize,
    /// Last written position per track key for this process
    last_saved: HashMap<String, f64>,
}

impl ProgressStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_limits(
            store,
            DEFAULT_PROGRESS_THRESHOLD_SECS,
            DEFAULT_MAX_PROGRESS_ENTRIES,
        )
    }

    pub fn with_limits(store: Arc<dyn KeyValueStore>, threshold: f64, max_entries: usize) -> Self {
        Self {
            store,
            threshold,
            max_entries: max_entries.max(1),
            last_saved: HashMap::new(),
        }
    }

    /// Save unless the position is within the threshold of the last write
    ///
    /// Returns whether a write happened.
    pub async fn save_if_needed(&mut self, track_key: &str, position: f64) -> Result<bool> {
        if let Some(last) = self.last_saved.get(track_key) {
            if (position - last).abs() <= self.threshold {
                return Ok(false);
            }
        }

        self.save(track_key, position).await?;
        Ok(true)
    }

    /// Save unconditionally and bump the track to most recently saved
    pub async fn save(&mut self, track_key: &str, position: f64) -> Result<()> {
        set_typed(self.store.as_ref(), &progress_key(track_key), &position).await?;

        let mut keys = self.keys().await;
        keys.retain(|key| key != track_key);
        keys.push(track_key.to_string());

        if keys.len() > self.max_entries {
            let overflow = keys.len() - self.max_entries;
            let evicted: Vec<String> = keys.drain(..overflow).collect();
            debug!("Evicting {} progress entries", evicted.len());
            let storage_keys: Vec<String> = evicted.iter().map(|key| progress_key(key)).collect();
            self.store.remove_many(&storage_keys).await?;
            for key in &evicted {
                self.last_saved.remove(key);
            }
        }

        set_typed(self.store.as_ref(), KEY_PROGRESS_LIST, &keys).await?;
        self.last_saved.insert(track_key.to_string(), position);
        Ok(())
    }

    /// Saved position, `0.0` when none
    pub async fn load(&self, track_key: &str) -> Result<f64> {
        Ok(get_typed::<f64>(self.store.as_ref(), &progress_key(track_key))
            .await?
            .unwrap_or(0.0))
    }

    /// Forget the saved position of one track
    pub async fn clear(&mut self, track_key: &str) -> Result<()> {
        self.store.remove(&progress_key(track_key)).await?;
        self.last_saved.remove(track_key);

        let mut keys = self.keys().await;
        keys.retain(|key| key != track_key);
        set_typed(self.store.as_ref(), KEY_PROGRESS_LIST, &keys).await
    }

    /// Forget every saved position
    pub async fn clear_all(&mut self) -> Result<()> {
        let storage_keys: Vec<String> = self.keys().await.iter().map(|key| progress_key(key)).collect();
        self.store.remove_many(&storage_keys).await?;
        self.store.remove(KEY_PROGRESS_LIST).await?;
        self.last_saved.clear();
        Ok(())
    }

    /// Track keys with a saved position, least recently saved first
    pub async fn keys(&self) -> Vec<String> {
        match get_typed::<Vec<String>>(self.store.as_ref(), KEY_PROGRESS_LIST).await {
            Ok(keys) => keys.unwrap_or_default(),
            Err(e) => {
                warn!("Progress key list is unreadable, starting over: {}", e);
                Vec::new()
            }
        }
    }
}
