//! Shared test helpers: a scriptable in-memory audio backend

#![allow(dead_code)]

use async_trait::async_trait;
use preview_core::{
    AudioBackend, BackendHandle, BackendStatus, CoreError, StatusCallback, Track,
};
use preview_playback::{PlaybackCoordinator, PlaybackState};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::sync::Notify;

static INIT: Once = Once::new();

/// Install a test subscriber once per test binary
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

pub fn track(id: &str) -> Track {
    Track::new(id, format!("Song {id}"), "Test Artist", url(id))
}

pub fn url(id: &str) -> String {
    format!("https://previews.test/{id}.m4a")
}

pub const PREVIEW_LEN: Duration = Duration::from_secs(30);

#[derive(Default)]
struct Resource {
    url: String,
    callback: Option<StatusCallback>,
    playing: bool,
    position: Duration,
    released: bool,
}

#[derive(Default)]
struct State {
    resources: HashMap<u64, Resource>,
    calls: Vec<String>,
    failing_loads: HashSet<String>,
    failing_stops: bool,
    failing_releases: bool,
    durations_hidden: bool,
}

/// In-memory backend that records calls and lets tests drive status ticks
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
    next_handle: AtomicU64,
    loads_in_flight: AtomicUsize,
    max_loads_in_flight: AtomicUsize,
    load_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make loads of this url fail
    pub fn fail_load(&self, url: &str) {
        self.state.lock().unwrap().failing_loads.insert(url.to_string());
    }

    /// Make every stop call fail
    pub fn fail_stops(&self) {
        self.state.lock().unwrap().failing_stops = true;
    }

    /// Make every release call fail
    pub fn fail_releases(&self) {
        self.state.lock().unwrap().failing_releases = true;
    }

    /// Report no duration on play/pause/seek echoes and ticks
    pub fn hide_durations(&self) {
        self.state.lock().unwrap().durations_hidden = true;
    }

    fn reported_duration(&self) -> Option<Duration> {
        if self.state.lock().unwrap().durations_hidden {
            None
        } else {
            Some(PREVIEW_LEN)
        }
    }

    /// Hold all loads until the returned notifier is signaled
    pub fn gate_loads(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.load_gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn load_count(&self) -> usize {
        self.calls().iter().filter(|c| c.starts_with("load ")).count()
    }

    pub fn max_loads_in_flight(&self) -> usize {
        self.max_loads_in_flight.load(Ordering::SeqCst)
    }

    /// Handle of the most recent load of `url`
    pub fn handle_for(&self, url: &str) -> Option<BackendHandle> {
        let state = self.state.lock().unwrap();
        state
            .resources
            .iter()
            .filter(|(_, r)| r.url == url)
            .map(|(h, _)| *h)
            .max()
            .map(BackendHandle::new)
    }

    /// Handles not yet released
    pub fn live_handles(&self) -> Vec<BackendHandle> {
        let state = self.state.lock().unwrap();
        let mut live: Vec<u64> = state
            .resources
            .iter()
            .filter(|(_, r)| !r.released)
            .map(|(h, _)| *h)
            .collect();
        live.sort_unstable();
        live.into_iter().map(BackendHandle::new).collect()
    }

    pub fn is_released(&self, handle: BackendHandle) -> bool {
        self.state
            .lock()
            .unwrap()
            .resources
            .get(&handle.raw())
            .is_some_and(|r| r.released)
    }

    pub fn has_callback(&self, handle: BackendHandle) -> bool {
        self.state
            .lock()
            .unwrap()
            .resources
            .get(&handle.raw())
            .is_some_and(|r| r.callback.is_some())
    }

    /// Deliver a raw status tick for a handle
    pub fn emit(&self, handle: BackendHandle, status: BackendStatus) {
        let callback = self
            .state
            .lock()
            .unwrap()
            .resources
            .get(&handle.raw())
            .and_then(|r| r.callback.clone());
        if let Some(callback) = callback {
            callback(status);
        }
    }

    /// Deliver a position tick
    pub fn tick(&self, handle: BackendHandle, position_secs: f64) {
        let position = Duration::from_secs_f64(position_secs);
        let playing = {
            let mut state = self.state.lock().unwrap();
            let resource = state.resources.get_mut(&handle.raw());
            resource.is_some_and(|r| {
                r.position = position;
                r.playing
            })
        };
        let duration = self.reported_duration();
        self.emit(handle, BackendStatus::loaded(playing, position, duration));
    }

    /// Play the resource to its natural end
    pub fn finish(&self, handle: BackendHandle) {
        if let Some(r) = self.state.lock().unwrap().resources.get_mut(&handle.raw()) {
            r.playing = false;
            r.position = PREVIEW_LEN;
        }
        self.emit(handle, BackendStatus::finished(PREVIEW_LEN));
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn echo_status(&self, handle: BackendHandle) {
        let duration = self.reported_duration();
        let status = {
            let state = self.state.lock().unwrap();
            state
                .resources
                .get(&handle.raw())
                .map(|r| BackendStatus::loaded(r.playing, r.position, duration))
        };
        if let Some(status) = status {
            self.emit(handle, status);
        }
    }

    fn with_live<T>(
        &self,
        handle: BackendHandle,
        f: impl FnOnce(&mut Resource) -> T,
    ) -> preview_core::Result<T> {
        let mut state = self.state.lock().unwrap();
        match state.resources.get_mut(&handle.raw()) {
            Some(r) if !r.released => Ok(f(r)),
            _ => Err(CoreError::InvalidHandle(handle.raw())),
        }
    }
}

#[async_trait]
impl AudioBackend for FakeBackend {
    async fn load(&self, resource: &str) -> preview_core::Result<BackendHandle> {
        self.record(format!("load {resource}"));
        let in_flight = self.loads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_loads_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        let gate = self.load_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        tokio::task::yield_now().await;
        self.loads_in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.state.lock().unwrap().failing_loads.contains(resource) {
            return Err(CoreError::load(format!("cannot decode {resource}")));
        }

        let raw = self.next_handle.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.lock().unwrap().resources.insert(
            raw,
            Resource {
                url: resource.to_string(),
                ..Default::default()
            },
        );
        Ok(BackendHandle::new(raw))
    }

    async fn play(&self, handle: BackendHandle) -> preview_core::Result<()> {
        self.record(format!("play {}", handle.raw()));
        self.with_live(handle, |r| r.playing = true)?;
        self.echo_status(handle);
        Ok(())
    }

    async fn pause(&self, handle: BackendHandle) -> preview_core::Result<()> {
        self.record(format!("pause {}", handle.raw()));
        self.with_live(handle, |r| r.playing = false)?;
        self.echo_status(handle);
        Ok(())
    }

    async fn stop(&self, handle: BackendHandle) -> preview_core::Result<()> {
        self.record(format!("stop {}", handle.raw()));
        if self.state.lock().unwrap().failing_stops {
            return Err(CoreError::backend("stop failed"));
        }
        self.with_live(handle, |r| {
            r.playing = false;
            r.position = Duration::ZERO;
        })
    }

    async fn release(&self, handle: BackendHandle) -> preview_core::Result<()> {
        self.record(format!("release {}", handle.raw()));
        let failing = self.state.lock().unwrap().failing_releases;
        self.with_live(handle, |r| {
            r.released = true;
            r.callback = None;
        })?;
        if failing {
            return Err(CoreError::backend("release failed"));
        }
        Ok(())
    }

    async fn seek(&self, handle: BackendHandle, position: Duration) -> preview_core::Result<()> {
        self.record(format!("seek {} {:.1}", handle.raw(), position.as_secs_f64()));
        self.with_live(handle, |r| r.position = position)?;
        self.echo_status(handle);
        Ok(())
    }

    fn subscribe(&self, handle: BackendHandle, callback: StatusCallback) -> preview_core::Result<()> {
        self.with_live(handle, |r| r.callback = Some(callback))
    }

    fn unsubscribe(&self, handle: BackendHandle) {
        if let Some(r) = self.state.lock().unwrap().resources.get_mut(&handle.raw()) {
            r.callback = None;
        }
    }
}

/// Wait until the coordinator's state satisfies `predicate`
pub async fn wait_for_state(
    coordinator: &PlaybackCoordinator,
    predicate: impl FnMut(&PlaybackState) -> bool,
) -> PlaybackState {
    let mut rx = coordinator.watch_state();
    let state = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for playback state")
        .expect("coordinator dropped");
    state.clone()
}

/// Let the event driver drain everything queued so far
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
