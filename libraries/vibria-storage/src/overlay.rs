//! Saving indicator coordination
//!
//! Writers call [`OverlayCoordinator::show`] when a background save starts and
//! [`OverlayCoordinator::hide`] when it ends. The indicator stays visible while
//! any save is in flight and for at least `min_visible` after the first `show`
//! of a burst, so short saves do not flicker.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

/// Default minimum dwell time of the indicator
pub const DEFAULT_MIN_VISIBLE: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct OverlayState {
    in_flight: usize,
    shown_at: Option<Instant>,
}

struct OverlayInner {
    state: Mutex<OverlayState>,
    visible: watch::Sender<bool>,
    min_visible: Duration,
}

/// Reference-counted saving indicator
///
/// Cheap to clone; all clones drive the same indicator.
#[derive(Clone)]
pub struct OverlayCoordinator {
    inner: Arc<OverlayInner>,
}

impl OverlayCoordinator {
    pub fn new(min_visible: Duration) -> Self {
        let (visible, _) = watch::channel(false);
        Self {
            inner: Arc::new(OverlayInner {
                state: Mutex::new(OverlayState::default()),
                visible,
                min_visible,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, OverlayState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a started operation and make the indicator visible
    pub fn show(&self) {
        let mut state = self.state();
        if state.in_flight == 0 {
            state.shown_at = Some(Instant::now());
        }
        state.in_flight += 1;
        self.inner.visible.send_if_modified(|visible| !std::mem::replace(visible, true));
    }

    /// Register a finished operation
    ///
    /// The indicator hides once no operation is in flight, waiting out the
    /// rest of the minimum dwell if needed. Must be called inside a tokio
    /// runtime when a delayed hide can be scheduled.
    pub fn hide(&self) {
        let remaining = {
            let mut state = self.state();
            state.in_flight = state.in_flight.saturating_sub(1);
            if state.in_flight > 0 {
                return;
            }
            state
                .shown_at
                .map(|shown_at| self.inner.min_visible.saturating_sub(shown_at.elapsed()))
                .unwrap_or_default()
        };

        if remaining.is_zero() {
            self.set_hidden();
            return;
        }

        debug!("Keeping saving indicator up for {:?}", remaining);
        let overlay = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            // A show() in the meantime owns the indicator now
            if overlay.state().in_flight == 0 {
                overlay.set_hidden();
            }
        });
    }

    fn set_hidden(&self) {
        self.inner.visible.send_if_modified(|visible| std::mem::replace(visible, false));
    }

    /// Whether the indicator is currently visible
    pub fn is_visible(&self) -> bool {
        *self.inner.visible.borrow()
    }

    /// Number of operations currently in flight
    pub fn in_flight(&self) -> usize {
        self.state().in_flight
    }

    /// Observe visibility changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.visible.subscribe()
    }
}

impl Default for OverlayCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_VISIBLE)
    }
}
