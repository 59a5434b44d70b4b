//! Playback engine adapter
//!
//! Wraps the platform [`AudioEngine`] so that at most one playback session
//! exists at a time. Starting a track tears down the previous session (engine
//! item, event routing, file access scope) before the next one is created.
//!
//! Engines report progress through an [`EngineEventSink`] from any thread.
//! Every event is tagged with the session it belongs to; events from a
//! superseded session are dropped by [`EngineAdapter::is_current`].

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use vibria_core::{AccessScope, FileAccess, NowPlaying, Result, TrackRef};

/// Identifier of one engine load
pub type SessionId = u64;

/// What an engine reports
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEventKind {
    /// Periodic position tick (about twice a second)
    Position {
        elapsed: f64,
        /// Raw duration; may be NaN, infinite or zero while unknown
        duration: f64,
        /// Playback rate, 0.0 when paused
        rate: f64,
    },
    /// The item played to its end
    Finished,
    /// A requested seek landed
    SeekCompleted { target: f64 },
    /// Asynchronous load or playback failure
    Failed { message: String },
}

/// Engine event tagged with its session
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub session: SessionId,
    pub kind: EngineEventKind,
}

/// Handle an engine uses to report events for one session
#[derive(Debug, Clone)]
pub struct EngineEventSink {
    session: SessionId,
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EngineEventSink {
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Send an event. Returns `false` once the adapter is gone.
    pub fn send(&self, kind: EngineEventKind) -> bool {
        self.tx
            .send(EngineEvent {
                session: self.session,
                kind,
            })
            .is_ok()
    }

    pub fn position(&self, elapsed: f64, duration: f64, rate: f64) -> bool {
        self.send(EngineEventKind::Position {
            elapsed,
            duration,
            rate,
        })
    }

    pub fn finished(&self) -> bool {
        self.send(EngineEventKind::Finished)
    }

    pub fn seek_completed(&self, target: f64) -> bool {
        self.send(EngineEventKind::SeekCompleted { target })
    }

    pub fn failed(&self, message: impl Into<String>) -> bool {
        self.send(EngineEventKind::Failed {
            message: message.into(),
        })
    }
}

/// Platform audio session category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCategory {
    /// Background-capable playback
    Playback,
    /// Silenced by other audio and the mute switch, no background audio
    SoloAmbient,
}

/// Platform audio engine
///
/// Implementors decode and render one item at a time and report ticks,
/// completion and seek results through the sink handed to [`load`].
///
/// [`load`]: AudioEngine::load
pub trait AudioEngine: Send {
    /// Prepare `track` for playback, paused at position 0
    ///
    /// # Errors
    /// Returns an error if the item cannot be created
    fn load(&mut self, track: &TrackRef, events: EngineEventSink) -> Result<()>;

    /// Start or resume playback of the loaded item
    fn play(&mut self);

    /// Pause the loaded item
    fn pause(&mut self);

    /// Request a seek; completion is reported as `SeekCompleted`
    ///
    /// # Errors
    /// Returns an error if nothing is loaded or the item cannot seek
    fn seek(&mut self, seconds: f64) -> Result<()>;

    /// Stop and release the loaded item; no further events for it
    fn unload(&mut self);

    /// Publish or clear now-playing metadata
    fn set_now_playing(&mut self, info: Option<&NowPlaying>) {
        let _ = info;
    }

    /// Configure the platform audio session category
    fn set_session_category(&mut self, category: SessionCategory) -> Result<()> {
        let _ = category;
        Ok(())
    }

    /// Activate or deactivate the platform audio session
    fn set_session_active(&mut self, active: bool) -> Result<()> {
        let _ = active;
        Ok(())
    }
}

struct ActiveSession {
    id: SessionId,
    track: TrackRef,
    /// Held for the whole session; dropping it releases file access
    _scope: AccessScope,
}

/// Single-session owner of the audio engine
pub struct EngineAdapter {
    engine: Box<dyn AudioEngine>,
    access: Arc<dyn FileAccess>,
    events_tx: mpsc::UnboundedSender<EngineEvent>,
    events_rx: mpsc::UnboundedReceiver<EngineEvent>,
    last_session: SessionId,
    active: Option<ActiveSession>,
}

impl EngineAdapter {
    pub fn new(engine: Box<dyn AudioEngine>, access: Arc<dyn FileAccess>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            engine,
            access,
            events_tx,
            events_rx,
            last_session: 0,
            active: None,
        }
    }

    /// Start a new session for `track`
    ///
    /// The previous session is torn down first. The item is loaded, moved to
    /// `start_at` if non-zero, and played if `autoplay`.
    pub fn start(&mut self, track: &TrackRef, start_at: Option<f64>, autoplay: bool) -> Result<SessionId> {
        self.stop();

        let scope = self.access.open_scope(track)?;
        self.last_session += 1;
        let id = self.last_session;
        let sink = EngineEventSink {
            session: id,
            tx: self.events_tx.clone(),
        };

        self.configure_session();

        if let Err(e) = self.engine.load(track, sink) {
            error!("Failed to load {}: {}", track, e);
            return Err(e);
        }
        self.active = Some(ActiveSession {
            id,
            track: track.clone(),
            _scope: scope,
        });

        if let Some(at) = start_at.filter(|at| *at > 0.0) {
            if let Err(e) = self.engine.seek(at) {
                warn!("Initial seek to {:.1}s failed: {}", at, e);
            }
        }
        if autoplay {
            self.engine.play();
        }

        debug!("Session {} started for {} (autoplay: {})", id, track, autoplay);
        Ok(id)
    }

    fn configure_session(&mut self) {
        if let Err(e) = self.engine.set_session_category(SessionCategory::Playback) {
            warn!("Audio session category failed: {}", e);
            return;
        }
        if let Err(e) = self.engine.set_session_active(true) {
            warn!("Audio session activation failed: {}", e);
        }
    }

    /// Tear down the current session, releasing file access
    pub fn stop(&mut self) {
        if let Some(session) = self.active.take() {
            self.engine.unload();
            debug!("Session {} stopped", session.id);
        }
    }

    /// Resume the current session. Returns `false` if there is none.
    pub fn play(&mut self) -> bool {
        if self.active.is_none() {
            return false;
        }
        self.engine.play();
        true
    }

    /// Pause the current session. Returns `false` if there is none.
    pub fn pause(&mut self) -> bool {
        if self.active.is_none() {
            return false;
        }
        self.engine.pause();
        true
    }

    /// Request a seek in the current session
    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        if self.active.is_none() {
            return Err(vibria_core::VibriaError::engine("no active session"));
        }
        self.engine.seek(seconds)
    }

    pub fn has_session(&self) -> bool {
        self.active.is_some()
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.active.as_ref().map(|session| session.id)
    }

    pub fn current_track(&self) -> Option<&TrackRef> {
        self.active.as_ref().map(|session| &session.track)
    }

    /// Whether `event` belongs to the live session
    pub fn is_current(&self, event: &EngineEvent) -> bool {
        self.current_session() == Some(event.session)
    }

    /// Next queued event without waiting
    pub fn try_next_event(&mut self) -> Option<EngineEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Wait for the next event
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        self.events_rx.recv().await
    }

    pub fn set_now_playing(&mut self, info: Option<&NowPlaying>) {
        self.engine.set_now_playing(info);
    }

    /// Silence everything for process teardown
    ///
    /// Detaches the session, clears now-playing and moves the platform
    /// session to a non-background category before deactivating it.
    /// Deactivation is retried once; failures are only logged.
    pub fn hard_stop_and_silence(&mut self) {
        if self.active.is_some() {
            self.engine.pause();
        }
        self.stop();
        self.engine.set_now_playing(None);

        if let Err(e) = self.engine.set_session_category(SessionCategory::SoloAmbient) {
            warn!("Hard stop: category change failed: {}", e);
        }
        if let Err(e) = self.engine.set_session_active(true) {
            warn!("Hard stop: activation failed: {}", e);
        }
        if let Err(e) = self.engine.set_session_active(false) {
            warn!("Hard stop: deactivation failed, retrying: {}", e);
            if let Err(e) = self.engine.set_session_active(false) {
                error!("Hard stop: deactivation retry failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use vibria_core::{AccessToken, VibriaError};

    #[derive(Default)]
    struct Calls(Mutex<Vec<String>>);

    impl Calls {
        fn push(&self, call: impl Into<String>) {
            self.0.lock().unwrap().push(call.into());
        }
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    struct RecordingEngine {
        calls: Arc<Calls>,
        fail_deactivate: usize,
    }

    impl AudioEngine for RecordingEngine {
        fn load(&mut self, track: &TrackRef, _events: EngineEventSink) -> Result<()> {
            self.calls.push(format!("load {}", track.file_name()));
            Ok(())
        }
        fn play(&mut self) {
            self.calls.push("play");
        }
        fn pause(&mut self) {
            self.calls.push("pause");
        }
        fn seek(&mut self, seconds: f64) -> Result<()> {
            self.calls.push(format!("seek {seconds}"));
            Ok(())
        }
        fn unload(&mut self) {
            self.calls.push("unload");
        }
        fn set_session_category(&mut self, category: SessionCategory) -> Result<()> {
            self.calls.push(format!("category {category:?}"));
            Ok(())
        }
        fn set_session_active(&mut self, active: bool) -> Result<()> {
            self.calls.push(format!("active {active}"));
            if !active && self.fail_deactivate > 0 {
                self.fail_deactivate -= 1;
                return Err(VibriaError::engine("busy"));
            }
            Ok(())
        }
    }

    /// Access that counts open scopes
    struct CountingAccess {
        open: Arc<AtomicUsize>,
    }

    impl FileAccess for CountingAccess {
        fn is_available(&self, _track: &TrackRef) -> bool {
            true
        }
        fn open_scope(&self, track: &TrackRef) -> Result<AccessScope> {
            self.open.fetch_add(1, Ordering::SeqCst);
            let open = self.open.clone();
            Ok(AccessScope::new(track.clone(), move || {
                open.fetch_sub(1, Ordering::SeqCst);
            }))
        }
        fn create_token(&self, track: &TrackRef) -> Result<AccessToken> {
            Ok(AccessToken::from_bytes(track.to_string().into_bytes()))
        }
        fn resolve_token(&self, token: &AccessToken) -> Result<TrackRef> {
            Ok(TrackRef::from(String::from_utf8_lossy(token.as_bytes()).as_ref()))
        }
    }

    fn adapter(fail_deactivate: usize) -> (EngineAdapter, Arc<Calls>, Arc<AtomicUsize>) {
        let calls = Arc::new(Calls::default());
        let open = Arc::new(AtomicUsize::new(0));
        let adapter = EngineAdapter::new(
            Box::new(RecordingEngine {
                calls: calls.clone(),
                fail_deactivate,
            }),
            Arc::new(CountingAccess { open: open.clone() }),
        );
        (adapter, calls, open)
    }

    #[test]
    fn start_replaces_previous_session_and_scope() {
        let (mut adapter, calls, open) = adapter(0);

        let first = adapter.start(&"a.mp3".into(), None, true).unwrap();
        assert_eq!(open.load(Ordering::SeqCst), 1);
        let second = adapter.start(&"b.mp3".into(), Some(30.0), false).unwrap();
        assert_eq!(open.load(Ordering::SeqCst), 1);
        assert!(second > first);

        let calls = calls.take();
        let unload = calls.iter().position(|c| c == "unload").unwrap();
        let load_b = calls.iter().position(|c| c == "load b.mp3").unwrap();
        assert!(unload < load_b);
        assert!(calls.contains(&"seek 30".to_string()));
        assert_eq!(calls.iter().filter(|c| *c == "play").count(), 1);

        adapter.stop();
        assert_eq!(open.load(Ordering::SeqCst), 0);
        assert!(!adapter.has_session());
    }

    #[test]
    fn stale_events_are_not_current() {
        let (mut adapter, _, _) = adapter(0);
        let first = adapter.start(&"a.mp3".into(), None, true).unwrap();
        let second = adapter.start(&"b.mp3".into(), None, true).unwrap();

        let stale = EngineEvent {
            session: first,
            kind: EngineEventKind::Finished,
        };
        let live = EngineEvent {
            session: second,
            kind: EngineEventKind::Finished,
        };
        assert!(!adapter.is_current(&stale));
        assert!(adapter.is_current(&live));
    }

    #[test]
    fn play_without_session_is_reported() {
        let (mut adapter, calls, _) = adapter(0);
        assert!(!adapter.play());
        assert!(!adapter.pause());
        assert!(adapter.seek(3.0).is_err());
        assert!(calls.take().is_empty());
    }

    #[test]
    fn hard_stop_retries_deactivation_once() {
        let (mut adapter, calls, open) = adapter(2);
        adapter.start(&"a.mp3".into(), None, true).unwrap();
        calls.take();

        adapter.hard_stop_and_silence();
        assert_eq!(open.load(Ordering::SeqCst), 0);
        assert_eq!(
            calls.take(),
            vec![
                "pause",
                "unload",
                "category SoloAmbient",
                "active true",
                "active false",
                "active false",
            ]
        );
    }
}
