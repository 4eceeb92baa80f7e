//! Playback coordinator - core orchestration
//!
//! Glues the playlist to the live session:
//! - At most one `play_track` transition in flight; concurrent requests are dropped
//! - Previous session fully retired (stop + release) before a new one loads
//! - Session status events marshaled onto one driver task
//! - Auto-advance on natural end, consuming the finished track

use crate::{
    config::PlayerConfig,
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    playlist::PlaylistEngine,
    session::{PlaybackSession, SessionEvent},
    types::{PlayOutcome, PlaybackState, SessionStatus},
};
use preview_core::{AudioBackend, Track, TrackId};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch, Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

/// Generation value meaning "no live session"
const NO_SESSION: u64 = 0;

/// The live session and the generation its events are tagged with
struct LiveSession {
    generation: u64,
    session: PlaybackSession,
}

type SessionSlot = Option<LiveSession>;

struct Inner {
    backend: Arc<dyn AudioBackend>,
    config: PlayerConfig,

    // Exclusive lock over the live session
    session: AsyncMutex<SessionSlot>,
    playlist: Mutex<PlaylistEngine>,

    // Observable snapshots and event stream
    state_tx: watch::Sender<PlaybackState>,
    playlist_tx: watch::Sender<Vec<Track>>,
    events_tx: broadcast::Sender<PlaybackEvent>,

    // Session events, tagged with their generation
    status_tx: mpsc::UnboundedSender<(u64, SessionEvent)>,
    live_generation: AtomicU64,
    next_generation: AtomicU64,

    // Seek slider is being dragged
    scrubbing: AtomicBool,

    driver: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(driver) = self
            .driver
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            driver.abort();
        }

        let Some(mut live) = self.session.get_mut().take() else {
            return;
        };
        live.session.detach();

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                debug!(generation = live.generation, "Releasing session of dropped coordinator");
                runtime.spawn(async move {
                    if let Err(e) = live.session.stop().await {
                        warn!(error = %e, "Ignoring failure while stopping session");
                    }
                    if let Err(e) = live.session.release().await {
                        warn!(error = %e, "Ignoring failure while releasing session");
                    }
                });
            }
            Err(_) => {
                warn!(
                    handle = %live.session.handle(),
                    "Coordinator dropped outside a runtime, backend resource not released"
                );
            }
        }
    }
}

/// Central playback coordination
///
/// Cheap to clone; all clones drive the same player. Must be created from
/// within a Tokio runtime, since construction spawns the task that applies
/// session status events. When the last clone is dropped the live session is
/// stopped and released on the runtime; [`shutdown`](Self::shutdown) does the
/// same but waits for it.
#[derive(Clone)]
pub struct PlaybackCoordinator {
    inner: Arc<Inner>,
}

fn lock_playlist(playlist: &Mutex<PlaylistEngine>) -> MutexGuard<'_, PlaylistEngine> {
    playlist.lock().unwrap_or_else(PoisonError::into_inner)
}

fn secs(duration: Duration) -> f64 {
    duration.as_secs_f64()
}

impl PlaybackCoordinator {
    /// Create new playback coordinator
    ///
    /// An invalid `preview_duration_secs` falls back to the default.
    pub fn new(backend: Arc<dyn AudioBackend>, config: PlayerConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                warn!(error = %e, "Invalid player configuration, using default preview duration");
                PlayerConfig {
                    preview_duration_secs: PlayerConfig::default().preview_duration_secs,
                    ..config
                }
            }
        };
        let (state_tx, _) = watch::channel(PlaybackState::idle(config.preview_duration_secs));
        let (playlist_tx, _) = watch::channel(Vec::new());
        let (events_tx, _) = broadcast::channel(config.event_capacity.max(1));
        let (status_tx, status_rx) = mpsc::unbounded_channel();

        let inner = Arc::new(Inner {
            backend,
            config,
            session: AsyncMutex::new(None),
            playlist: Mutex::new(PlaylistEngine::new()),
            state_tx,
            playlist_tx,
            events_tx,
            status_tx,
            live_generation: AtomicU64::new(NO_SESSION),
            next_generation: AtomicU64::new(NO_SESSION),
            scrubbing: AtomicBool::new(false),
            driver: Mutex::new(None),
        });

        let driver = tokio::spawn(Self::drive_session_events(
            Arc::downgrade(&inner),
            status_rx,
        ));
        *inner.driver.lock().unwrap_or_else(PoisonError::into_inner) = Some(driver);

        Self { inner }
    }

    /// Create a coordinator with default configuration
    pub fn with_backend(backend: Arc<dyn AudioBackend>) -> Self {
        Self::new(backend, PlayerConfig::default())
    }

    /// Apply session events one at a time, in arrival order
    async fn drive_session_events(
        inner: Weak<Inner>,
        mut status_rx: mpsc::UnboundedReceiver<(u64, SessionEvent)>,
    ) {
        while let Some((generation, event)) = status_rx.recv().await {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            PlaybackCoordinator { inner }
                .handle_session_event(generation, event)
                .await;
        }
        debug!("Session event driver stopped");
    }

    // ===== Playback Control =====

    /// Play a track, enqueueing it first if it is not in the playlist
    ///
    /// The track is enqueued even when the start itself is dropped. Returns
    /// [`PlayOutcome::Dropped`] if another start is still in flight; the live
    /// session is left untouched. On a load failure the player returns to
    /// `Idle`, an [`PlaybackEvent::Error`] is emitted, and the error is returned.
    pub async fn play_track(&self, track: Track) -> Result<PlayOutcome> {
        self.enqueue(&track);

        let Ok(mut slot) = self.inner.session.try_lock() else {
            debug!(track_id = %track.id, "Start already in flight, dropping play request");
            return Ok(PlayOutcome::Dropped);
        };
        self.start_locked(&mut slot, track).await
    }

    /// Retire the old session and bring up a new one, with the lock held
    ///
    /// `track` is expected to be in the playlist already.
    async fn start_locked(
        &self,
        slot: &mut AsyncMutexGuard<'_, SessionSlot>,
        track: Track,
    ) -> Result<PlayOutcome> {
        if let Some(live) = slot.take() {
            self.retire(live).await;
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let previous_track_id = self.state().active_track.map(|t| t.id);
        self.inner.scrubbing.store(false, Ordering::SeqCst);

        let default_duration = self.inner.config.preview_duration_secs;
        let loading = track.clone();
        self.update_state(move |state| {
            state.active_track = Some(loading);
            state.status = SessionStatus::Loading;
            state.position_secs = 0.0;
            state.duration_secs = default_duration;
        });
        self.emit(PlaybackEvent::TrackChanged {
            track_id: Some(track.id.clone()),
            previous_track_id,
        });

        info!(track_id = %track.id, title = %track.title, "Loading track");

        let mut session =
            match PlaybackSession::load(Arc::clone(&self.inner.backend), &track.preview_url).await
            {
                Ok(session) => session,
                Err(e) => {
                    error!(track_id = %track.id, error = %e, "Failed to load track");
                    self.fail_to_idle(&e);
                    return Err(e);
                }
            };

        self.inner.live_generation.store(generation, Ordering::SeqCst);
        let status_tx = self.inner.status_tx.clone();
        let subscribed = session.on_status(move |event| {
            // Receiver only goes away with the coordinator
            let _ = status_tx.send((generation, event));
        });

        if let Err(e) = match subscribed {
            Ok(()) => session.play().await,
            Err(e) => Err(e),
        } {
            error!(track_id = %track.id, error = %e, "Failed to start playback");
            self.retire(LiveSession {
                generation,
                session,
            })
            .await;
            self.fail_to_idle(&e);
            return Err(e);
        }

        self.update_state(|state| state.status = SessionStatus::Playing);
        **slot = Some(LiveSession {
            generation,
            session,
        });

        debug!(track_id = %track.id, generation, "Track playing");
        Ok(PlayOutcome::Started)
    }

    /// Stop and release a session, swallowing failures
    async fn retire(&self, mut live: LiveSession) {
        self.inner
            .live_generation
            .compare_exchange(
                live.generation,
                NO_SESSION,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .ok();

        if let Err(e) = live.session.stop().await {
            warn!(generation = live.generation, error = %e, "Ignoring failure while stopping session");
        }
        if let Err(e) = live.session.release().await {
            warn!(generation = live.generation, error = %e, "Ignoring failure while releasing session");
        }
    }

    fn fail_to_idle(&self, err: &PlaybackError) {
        self.go_idle();
        self.emit(PlaybackEvent::Error {
            message: err.to_string(),
        });
    }

    fn go_idle(&self) {
        let previous_track_id = self.state().active_track.map(|t| t.id);
        let default_duration = self.inner.config.preview_duration_secs;
        self.inner.scrubbing.store(false, Ordering::SeqCst);
        self.update_state(move |state| *state = PlaybackState::idle(default_duration));
        if previous_track_id.is_some() {
            self.emit(PlaybackEvent::TrackChanged {
                track_id: None,
                previous_track_id,
            });
        }
    }

    /// Pause playback
    ///
    /// No-op without an active session.
    pub async fn pause(&self) -> Result<()> {
        let mut slot = self.inner.session.lock().await;
        let Some(live) = slot.as_mut() else {
            return Ok(());
        };

        match live.session.pause().await {
            Ok(()) => {
                self.update_state(|state| {
                    if state.status == SessionStatus::Playing {
                        state.status = SessionStatus::Paused;
                    }
                });
                Ok(())
            }
            Err(e) => Self::recover_stale(e, "pause"),
        }
    }

    /// Resume playback
    ///
    /// No-op without an active session.
    pub async fn resume(&self) -> Result<()> {
        let mut slot = self.inner.session.lock().await;
        let Some(live) = slot.as_mut() else {
            return Ok(());
        };

        match live.session.play().await {
            Ok(()) => {
                self.update_state(|state| {
                    if state.status == SessionStatus::Paused {
                        state.status = SessionStatus::Playing;
                    }
                });
                Ok(())
            }
            Err(e) => Self::recover_stale(e, "resume"),
        }
    }

    /// Stop and release the active session and return to `Idle`
    ///
    /// Never triggers auto-advance, even if the track already finished and
    /// the finish has not been handled yet.
    pub async fn close_player(&self) {
        let mut slot = self.inner.session.lock().await;
        if let Some(live) = slot.take() {
            info!(generation = live.generation, "Closing player");
            self.retire(live).await;
        }
        self.inner.live_generation.store(NO_SESSION, Ordering::SeqCst);
        self.go_idle();
    }

    /// Mark the seek slider as being dragged
    ///
    /// Position ticks stop moving `position_secs` until the next `seek_to`.
    pub fn begin_scrub(&self) {
        self.inner.scrubbing.store(true, Ordering::SeqCst);
    }

    /// Seek within the active track
    ///
    /// No-op without an active session. The target is clamped to the known
    /// duration.
    pub async fn seek_to(&self, position_secs: f64) -> Result<()> {
        self.inner.scrubbing.store(false, Ordering::SeqCst);

        let mut slot = self.inner.session.lock().await;
        let Some(live) = slot.as_mut() else {
            return Ok(());
        };

        let duration_secs = self.state().duration_secs;
        let target = if position_secs.is_finite() {
            position_secs.clamp(0.0, duration_secs.max(0.0))
        } else {
            0.0
        };

        match live.session.seek(Duration::from_secs_f64(target)).await {
            Ok(()) => {
                self.update_state(|state| state.position_secs = target);
                self.emit(PlaybackEvent::position(target, duration_secs));
                Ok(())
            }
            Err(e) => Self::recover_stale(e, "seek"),
        }
    }

    /// Play the track after the active one (wrapping)
    ///
    /// Returns `None` when the playlist is empty.
    pub async fn skip_next(&self) -> Result<Option<PlayOutcome>> {
        let current = self.state().active_track.map(|t| t.id);
        let target = lock_playlist(&self.inner.playlist).next(current.as_ref());
        match target {
            Some(track) => self.play_track(track).await.map(Some),
            None => Ok(None),
        }
    }

    /// Play the track before the active one (wrapping)
    ///
    /// Returns `None` when the playlist is empty.
    pub async fn skip_previous(&self) -> Result<Option<PlayOutcome>> {
        let current = self.state().active_track.map(|t| t.id);
        let target = lock_playlist(&self.inner.playlist).previous(current.as_ref());
        match target {
            Some(track) => self.play_track(track).await.map(Some),
            None => Ok(None),
        }
    }

    /// Close the player and stop the event driver
    pub async fn shutdown(&self) {
        self.close_player().await;
        let driver = self
            .inner
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(driver) = driver {
            driver.abort();
        }
        info!("Playback coordinator shut down");
    }

    fn recover_stale(err: PlaybackError, operation: &str) -> Result<()> {
        if err.is_stale_session() {
            warn!(operation, error = %err, "Ignoring operation on stale session");
            Ok(())
        } else {
            Err(err)
        }
    }

    // ===== Session Events =====

    async fn handle_session_event(&self, generation: u64, event: SessionEvent) {
        if generation != self.inner.live_generation.load(Ordering::SeqCst) {
            trace!(generation, ?event, "Discarding event from retired session");
            return;
        }

        match event {
            SessionEvent::Loaded { duration } => {
                if let Some(duration) = duration.filter(|d| !d.is_zero()) {
                    self.update_state(|state| state.duration_secs = secs(duration));
                }
            }
            SessionEvent::Progress { position, duration } => {
                let scrubbing = self.inner.scrubbing.load(Ordering::SeqCst);
                let mut snapshot = (0.0, 0.0);
                self.update_state(|state| {
                    if let Some(duration) = duration.filter(|d| !d.is_zero()) {
                        state.duration_secs = secs(duration);
                    }
                    if !scrubbing {
                        // max() also maps a NaN duration to 0
                        state.position_secs =
                            secs(position).clamp(0.0, state.duration_secs.max(0.0));
                    }
                    snapshot = (state.position_secs, state.duration_secs);
                });
                self.emit(PlaybackEvent::position(snapshot.0, snapshot.1));
            }
            SessionEvent::PlaybackChanged { playing } => {
                self.update_state(|state| {
                    state.status = match (state.status, playing) {
                        (SessionStatus::Paused, true) => SessionStatus::Playing,
                        (SessionStatus::Playing, false) => SessionStatus::Paused,
                        (status, _) => status,
                    };
                });
            }
            SessionEvent::Finished => self.on_session_finished(generation).await,
        }
    }

    /// Consume the finished track and auto-advance
    async fn on_session_finished(&self, generation: u64) {
        let mut slot = self.inner.session.lock().await;

        // Closed or superseded while this event was queued
        let still_live = slot.as_ref().map(|live| live.generation) == Some(generation)
            && self.inner.live_generation.load(Ordering::SeqCst) == generation;
        if !still_live {
            debug!(generation, "Finish arrived for a session that is gone, not advancing");
            return;
        }

        let finished = self.state().active_track;
        if let Some(track) = &finished {
            info!(track_id = %track.id, "Track finished");
            self.emit(PlaybackEvent::TrackFinished {
                track_id: track.id.clone(),
            });
        }
        self.update_state(|state| {
            state.status = SessionStatus::Finished;
            state.position_secs = 0.0;
        });

        let next = {
            let mut playlist = lock_playlist(&self.inner.playlist);
            let next = match &finished {
                Some(track) => playlist.advance_after_finish(&track.id),
                None => playlist.next_after_removal(None),
            };
            self.publish_playlist(&playlist);
            next
        };

        match next {
            Some(track) => {
                debug!(track_id = %track.id, "Auto-advancing");
                if let Err(e) = self.start_locked(&mut slot, track).await {
                    warn!(error = %e, "Auto-advance failed");
                }
            }
            None => {
                debug!("Playlist exhausted, going idle");
                if let Some(live) = slot.take() {
                    self.retire(live).await;
                }
                self.go_idle();
            }
        }
    }

    // ===== Playlist =====

    fn enqueue(&self, track: &Track) {
        let mut playlist = lock_playlist(&self.inner.playlist);
        if playlist.add(track.clone()) {
            debug!(track_id = %track.id, "Enqueued track");
            self.publish_playlist(&playlist);
        }
    }

    /// Append a track unless already present
    pub fn add_to_playlist(&self, track: Track) -> bool {
        let mut playlist = lock_playlist(&self.inner.playlist);
        let added = playlist.add(track);
        if added {
            self.publish_playlist(&playlist);
        }
        added
    }

    /// Remove a track from the playlist
    ///
    /// Removing the active track does not interrupt it.
    pub fn remove_from_playlist(&self, track_id: &TrackId) -> Option<Track> {
        let mut playlist = lock_playlist(&self.inner.playlist);
        let removed = playlist.remove(track_id);
        if removed.is_some() {
            self.publish_playlist(&playlist);
        }
        removed
    }

    /// Add the track if absent, remove it if present
    pub fn toggle_playlist(&self, track: Track) -> bool {
        let mut playlist = lock_playlist(&self.inner.playlist);
        let present = playlist.toggle(track);
        self.publish_playlist(&playlist);
        present
    }

    /// Empty the playlist
    pub fn clear_playlist(&self) {
        let mut playlist = lock_playlist(&self.inner.playlist);
        playlist.clear();
        self.publish_playlist(&playlist);
    }

    /// Shuffle the playlist
    pub fn shuffle_playlist(&self) {
        let mut playlist = lock_playlist(&self.inner.playlist);
        if playlist.len() > 1 {
            playlist.shuffle();
            self.publish_playlist(&playlist);
        }
    }

    /// Whether the track is in the playlist
    pub fn is_in_playlist(&self, track_id: &TrackId) -> bool {
        lock_playlist(&self.inner.playlist).contains(track_id)
    }

    fn publish_playlist(&self, playlist: &PlaylistEngine) {
        let length = playlist.len();
        self.inner.playlist_tx.send_replace(playlist.snapshot());
        self.emit(PlaybackEvent::PlaylistChanged { length });
    }

    // ===== State Queries =====

    /// Current playback snapshot
    pub fn state(&self) -> PlaybackState {
        self.inner.state_tx.borrow().clone()
    }

    /// Observe playback snapshots
    pub fn watch_state(&self) -> watch::Receiver<PlaybackState> {
        self.inner.state_tx.subscribe()
    }

    /// Current playlist snapshot
    pub fn playlist(&self) -> Vec<Track> {
        self.inner.playlist_tx.borrow().clone()
    }

    /// Observe playlist snapshots
    pub fn watch_playlist(&self) -> watch::Receiver<Vec<Track>> {
        self.inner.playlist_tx.subscribe()
    }

    /// Subscribe to playback events
    pub fn subscribe_events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.inner.events_tx.subscribe()
    }

    /// Configuration this coordinator was built with
    pub fn config(&self) -> &PlayerConfig {
        &self.inner.config
    }

    fn update_state(&self, f: impl FnOnce(&mut PlaybackState)) {
        let mut changed = None;
        self.inner.state_tx.send_modify(|state| {
            let before = state.status;
            f(state);
            if state.status != before {
                changed = Some(state.status);
            }
        });
        if let Some(state) = changed {
            debug!(?state, "Session status changed");
            self.emit(PlaybackEvent::StateChanged { state });
        }
    }

    fn emit(&self, event: PlaybackEvent) {
        // No subscribers is fine
        let _ = self.inner.events_tx.send(event);
    }
}

impl std::fmt::Debug for PlaybackCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackCoordinator")
            .field("state", &*self.inner.state_tx.borrow())
            .field("playlist_len", &self.inner.playlist_tx.borrow().len())
            .finish_non_exhaustive()
    }
}
