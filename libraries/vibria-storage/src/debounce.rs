//! Debounced persistence of a single key
//!
//! A burst of mutations produces one write once the burst has been quiet for
//! `delay`. The saving indicator is shown once at the start of the burst and
//! hidden after the write lands, success or failure.

use crate::overlay::OverlayCoordinator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use vibria_core::{KeyValueStore, Result};

/// Coalescing writer for one storage key
pub struct DebouncedWriter {
    key: &'static str,
    delay: Duration,
    store: Arc<dyn KeyValueStore>,
    overlay: OverlayCoordinator,
    /// Set from the first mutation of a burst until its write completes
    saving: Arc<AtomicBool>,
    /// Generation of the newest value handed to storage
    written: Arc<Mutex<u64>>,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl DebouncedWriter {
    pub fn new(
        key: &'static str,
        delay: Duration,
        store: Arc<dyn KeyValueStore>,
        overlay: OverlayCoordinator,
    ) -> Self {
        Self {
            key,
            delay,
            store,
            overlay,
            saving: Arc::new(AtomicBool::new(false)),
            written: Arc::new(Mutex::new(0)),
            generation: 0,
            pending: None,
        }
    }

    /// Schedule `value` to be written after the quiet period
    ///
    /// Replaces any value scheduled earlier in the same burst. Must be called
    /// inside a tokio runtime.
    pub fn schedule(&mut self, value: serde_json::Value) {
        if !self.saving.swap(true, Ordering::SeqCst) {
            self.overlay.show();
        }

        if let Some(handle) = self.pending.take() {
            handle.abort();
        }

        self.generation += 1;
        let write = WriteJob {
            key: self.key,
            generation: self.generation,
            value,
            store: self.store.clone(),
            written: self.written.clone(),
        };
        let saving = self.saving.clone();
        let overlay = self.overlay.clone();
        let delay = self.delay;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detached so that a later abort cannot cut the write short
            tokio::spawn(async move {
                if let Err(e) = write.run().await {
                    warn!("Debounced save of {} failed: {}", write.key, e);
                }
                if saving.swap(false, Ordering::SeqCst) {
                    overlay.hide();
                }
            });
        }));
    }

    /// Cancel the pending write and persist `value` now
    pub async fn flush(&mut self, value: serde_json::Value) -> Result<()> {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }

        self.generation += 1;
        let write = WriteJob {
            key: self.key,
            generation: self.generation,
            value,
            store: self.store.clone(),
            written: self.written.clone(),
        };
        let result = write.run().await;

        if self.saving.swap(false, Ordering::SeqCst) {
            self.overlay.hide();
        }
        result
    }

    /// Drop the pending write without persisting anything
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
        if self.saving.swap(false, Ordering::SeqCst) {
            self.overlay.hide();
        }
    }

    /// Whether a burst is waiting for its write
    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }
}

impl Drop for DebouncedWriter {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

struct WriteJob {
    key: &'static str,
    generation: u64,
    value: serde_json::Value,
    store: Arc<dyn KeyValueStore>,
    written: Arc<Mutex<u64>>,
}

impl WriteJob {
    async fn run(&self) -> Result<()> {
        let mut written = self.written.lock().await;
        if *written > self.generation {
            debug!("Skipping stale write of {}", self.key);
            return Ok(());
        }
        self.store.set(self.key, self.value.clone()).await?;
        *written = self.generation;
        debug!("Saved {}", self.key);
        Ok(())
    }
}
