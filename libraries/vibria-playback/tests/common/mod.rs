//! Shared fakes for playback integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vibria_core::{
    AccessScope, AccessToken, FileAccess, KeyValueStore, NowPlaying, Result, TrackRef,
    VibriaError,
};
use vibria_playback::{
    AudioEngine, EngineEventSink, PlaybackConfig, PlaybackManager, PlayerEvent, SessionCategory,
};
use vibria_storage::MemoryStore;

pub fn track(name: &str) -> TrackRef {
    TrackRef::from(format!("/music/{name}").as_str())
}

pub fn tracks(names: &[&str]) -> Vec<TrackRef> {
    names.iter().map(|name| track(name)).collect()
}

/// Engine call as seen by the fake
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(String),
    Play,
    Pause,
    Seek(f64),
    Unload,
    NowPlaying(Option<String>),
    Category(SessionCategory),
    Active(bool),
}

#[derive(Default)]
struct ProbeState {
    calls: Vec<Call>,
    sink: Option<EngineEventSink>,
}

/// Test-side handle onto the fake engine
#[derive(Clone, Default)]
pub struct EngineProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl EngineProbe {
    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut self.state.lock().unwrap().calls)
    }

    /// File names of every load, in order
    pub fn loads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Load(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Sink of the most recent load
    pub fn sink(&self) -> EngineEventSink {
        self.state
            .lock()
            .unwrap()
            .sink
            .clone()
            .expect("nothing loaded")
    }

    pub fn tick(&self, elapsed: f64, duration: f64) {
        self.sink().position(elapsed, duration, 1.0);
    }

    pub fn finish(&self) {
        self.sink().finished();
    }

    pub fn seek_done(&self, target: f64) {
        self.sink().seek_completed(target);
    }
}

/// Recording engine; events are injected through its [`EngineProbe`]
pub struct FakeEngine {
    probe: EngineProbe,
}

impl AudioEngine for FakeEngine {
    fn load(&mut self, track: &TrackRef, events: EngineEventSink) -> Result<()> {
        self.probe.record(Call::Load(track.file_name()));
        self.probe.state.lock().unwrap().sink = Some(events);
        Ok(())
    }

    fn play(&mut self) {
        self.probe.record(Call::Play);
    }

    fn pause(&mut self) {
        self.probe.record(Call::Pause);
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        self.probe.record(Call::Seek(seconds));
        Ok(())
    }

    fn unload(&mut self) {
        self.probe.record(Call::Unload);
        self.probe.state.lock().unwrap().sink = None;
    }

    fn set_now_playing(&mut self, info: Option<&NowPlaying>) {
        self.probe
            .record(Call::NowPlaying(info.map(|info| info.title.clone())));
    }

    fn set_session_category(&mut self, category: SessionCategory) -> Result<()> {
        self.probe.record(Call::Category(category));
        Ok(())
    }

    fn set_session_active(&mut self, active: bool) -> Result<()> {
        self.probe.record(Call::Active(active));
        Ok(())
    }
}

/// In-memory file access: a track is available once registered
#[derive(Default)]
pub struct FakeAccess {
    files: Mutex<HashSet<PathBuf>>,
    open_scopes: Arc<AtomicUsize>,
}

impl FakeAccess {
    pub fn with_files(tracks: &[TrackRef]) -> Arc<Self> {
        let access = Self::default();
        for track in tracks {
            access.add(track);
        }
        Arc::new(access)
    }

    pub fn add(&self, track: &TrackRef) {
        self.files.lock().unwrap().insert(track.path().to_path_buf());
    }

    pub fn remove(&self, track: &TrackRef) {
        self.files.lock().unwrap().remove(track.path());
    }

    pub fn open_scopes(&self) -> usize {
        self.open_scopes.load(Ordering::SeqCst)
    }
}

impl FileAccess for FakeAccess {
    fn is_available(&self, track: &TrackRef) -> bool {
        self.files.lock().unwrap().contains(track.path())
    }

    fn open_scope(&self, track: &TrackRef) -> Result<AccessScope> {
        if !self.is_available(track) {
            return Err(VibriaError::access(format!("{track} is gone")));
        }
        self.open_scopes.fetch_add(1, Ordering::SeqCst);
        let open = self.open_scopes.clone();
        Ok(AccessScope::new(track.clone(), move || {
            open.fetch_sub(1, Ordering::SeqCst);
        }))
    }

    fn create_token(&self, track: &TrackRef) -> Result<AccessToken> {
        Ok(AccessToken::from_bytes(track.to_string().into_bytes()))
    }

    fn resolve_token(&self, token: &AccessToken) -> Result<TrackRef> {
        let track = TrackRef::from(String::from_utf8_lossy(token.as_bytes()).as_ref());
        if !self.is_available(&track) {
            return Err(VibriaError::not_found("file", track.to_string()));
        }
        Ok(track)
    }
}

pub fn test_config() -> PlaybackConfig {
    PlaybackConfig {
        overlay_min_visible: Duration::ZERO,
        ..PlaybackConfig::default()
    }
}

/// Manager wired to fakes, with handles to inspect them
pub struct Harness {
    pub manager: PlaybackManager,
    pub engine: EngineProbe,
    pub access: Arc<FakeAccess>,
    pub store: MemoryStore,
}

impl Harness {
    pub async fn new(names: &[&str]) -> Self {
        Self::open(MemoryStore::new(), FakeAccess::with_files(&tracks(names))).await
    }

    /// Manager over existing state, as after a relaunch
    pub async fn open(store: MemoryStore, access: Arc<FakeAccess>) -> Self {
        let engine = EngineProbe::default();
        let manager = PlaybackManager::open(
            Box::new(FakeEngine {
                probe: engine.clone(),
            }),
            access.clone(),
            Arc::new(store.clone()),
            test_config(),
        )
        .await
        .unwrap();
        Self {
            manager,
            engine,
            access,
            store,
        }
    }

    /// Deliver every event the fake engine has sent
    pub async fn pump(&mut self) {
        self.manager.pump_engine_events().await.unwrap();
    }

    pub fn selected_name(&self) -> Option<String> {
        self.manager.selected().map(TrackRef::file_name)
    }
}

/// Everything currently buffered on a subscription
pub fn drain(rx: &mut tokio::sync::broadcast::Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Memory store whose writes to the listed keys fail
pub struct FlakyStore {
    inner: MemoryStore,
    failing: Vec<&'static str>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, failing: &[&'static str]) -> Self {
        Self {
            inner,
            failing: failing.to_vec(),
        }
    }

    fn check(&self, key: &str) -> Result<()> {
        if self.failing.iter().any(|failing| *failing == key) {
            return Err(VibriaError::storage("disk full"));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.check(key)?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check(key)?;
        self.inner.remove(key).await
    }
}

/// Manager over a store with failing keys, files for `names` available
pub async fn flaky_manager(names: &[&str], failing: &[&'static str]) -> (PlaybackManager, EngineProbe) {
    let engine = EngineProbe::default();
    let manager = PlaybackManager::open(
        Box::new(FakeEngine {
            probe: engine.clone(),
        }),
        FakeAccess::with_files(&tracks(names)),
        Arc::new(FlakyStore::new(MemoryStore::new(), failing)),
        test_config(),
    )
    .await
    .unwrap();
    (manager, engine)
}
