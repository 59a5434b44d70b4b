//! Simulated audio engine
//!
//! Plays nothing. Advances a virtual position while "playing" and reports
//! ticks, seeks and the end of the track like a real engine would, which is
//! enough to drive the player headlessly.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use vibria_core::{NowPlaying, Result, TrackRef, VibriaError};
use vibria_playback::{AudioEngine, EngineEventSink};

/// Interval between position ticks
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
struct Transport {
    position: f64,
    playing: bool,
}

pub struct SimulatedEngine {
    track_secs: f64,
    tick: Duration,
    transport: Arc<Mutex<Transport>>,
    events: Option<EngineEventSink>,
    ticker: Option<JoinHandle<()>>,
}

impl SimulatedEngine {
    pub fn new(track_secs: f64) -> Self {
        Self::with_tick(track_secs, TICK_INTERVAL)
    }

    pub fn with_tick(track_secs: f64, tick: Duration) -> Self {
        Self {
            track_secs,
            tick,
            transport: Arc::new(Mutex::new(Transport::default())),
            events: None,
            ticker: None,
        }
    }

    fn transport(&self) -> MutexGuard<'_, Transport> {
        lock(&self.transport)
    }
}

fn lock(transport: &Mutex<Transport>) -> MutexGuard<'_, Transport> {
    transport.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AudioEngine for SimulatedEngine {
    fn load(&mut self, track: &TrackRef, events: EngineEventSink) -> Result<()> {
        self.unload();
        *self.transport() = Transport::default();

        let transport = self.transport.clone();
        let sink = events.clone();
        let duration = self.track_secs;
        let step = self.tick.as_secs_f64();
        let mut interval = tokio::time::interval(self.tick);

        self.ticker = Some(tokio::spawn(async move {
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let (position, finished) = {
                    let mut t = lock(&transport);
                    if !t.playing {
                        continue;
                    }
                    t.position = (t.position + step).min(duration);
                    let finished = t.position >= duration;
                    if finished {
                        t.playing = false;
                    }
                    (t.position, finished)
                };

                if !sink.position(position, duration, 1.0) {
                    break;
                }
                if finished && !sink.finished() {
                    break;
                }
            }
        }));

        self.events = Some(events);
        info!("Loaded {} ({}s simulated)", track, self.track_secs);
        Ok(())
    }

    fn play(&mut self) {
        self.transport().playing = true;
    }

    fn pause(&mut self) {
        self.transport().playing = false;
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        let Some(events) = self.events.as_ref() else {
            return Err(VibriaError::engine("nothing loaded"));
        };
        let target = seconds.clamp(0.0, self.track_secs);
        self.transport().position = target;
        events.seek_completed(target);
        Ok(())
    }

    fn unload(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        self.events = None;
        self.transport().playing = false;
    }

    fn set_now_playing(&mut self, info: Option<&NowPlaying>) {
        match info {
            Some(info) => debug!(
                "Now playing: {} {:.0}/{:.0}s (rate {})",
                info.title, info.elapsed, info.duration, info.rate
            ),
            None => debug!("Now playing cleared"),
        }
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}
