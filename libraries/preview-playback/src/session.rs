//! Playback session
//!
//! One [`PlaybackSession`] wraps one resource loaded by the [`AudioBackend`].
//! Raw backend status ticks are funneled through a single filter that turns
//! them into [`SessionEvent`]s:
//! - `Loaded` once, on the first loaded tick
//! - `PlaybackChanged` when the playing flag flips
//! - `Progress` with monotonically increasing positions (a seek re-baselines)
//! - `Finished` exactly once, only for a natural end, never after `stop`

use crate::error::{PlaybackError, Result};
use preview_core::{AudioBackend, BackendHandle, BackendStatus, CoreError, StatusCallback};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Transport event delivered to the session's status callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    /// Resource finished loading
    Loaded {
        /// Duration, if the backend already knows it
        duration: Option<Duration>,
    },

    /// Playhead moved forward (or re-baselined after a seek)
    Progress {
        /// Current playhead
        position: Duration,
        /// Duration, if known
        duration: Option<Duration>,
    },

    /// Audio started or stopped producing sound
    PlaybackChanged {
        /// Whether audio is playing now
        playing: bool,
    },

    /// Resource played to its natural end
    Finished,
}

/// Callback receiving [`SessionEvent`]s
///
/// Invoked while the session's status filter is locked, so it must not call
/// back into the session.
pub type SessionCallback = Box<dyn Fn(SessionEvent) + Send + Sync + 'static>;

/// Turns raw backend ticks into ordered session events
#[derive(Default)]
struct StatusFilter {
    callback: Option<SessionCallback>,
    loaded_reported: bool,
    unloaded: bool,
    playing: Option<bool>,
    last_position: Option<Duration>,
    duration: Option<Duration>,
    finished: bool,
    stopped: bool,
}

impl StatusFilter {
    fn handle(&mut self, status: BackendStatus) {
        if !status.is_loaded {
            if self.loaded_reported {
                self.unloaded = true;
            }
            return;
        }
        if self.finished || self.stopped {
            trace!("Ignoring status tick after end of session");
            return;
        }

        if status.duration.is_some() {
            self.duration = status.duration;
        }

        if !self.loaded_reported {
            self.loaded_reported = true;
            self.deliver(SessionEvent::Loaded {
                duration: status.duration,
            });
        }

        if status.did_just_finish {
            self.finished = true;
            self.deliver(SessionEvent::Finished);
            return;
        }

        if self.playing != Some(status.is_playing) {
            self.playing = Some(status.is_playing);
            self.deliver(SessionEvent::PlaybackChanged {
                playing: status.is_playing,
            });
        }

        let moved_forward = self
            .last_position
            .map_or(true, |last| status.position >= last);
        if moved_forward {
            self.last_position = Some(status.position);
            self.deliver(SessionEvent::Progress {
                position: status.position,
                duration: self.duration,
            });
        } else {
            trace!(position = ?status.position, "Dropping out-of-order position tick");
        }
    }

    fn deliver(&self, event: SessionEvent) {
        if let Some(callback) = &self.callback {
            callback(event);
        }
    }
}

fn lock(filter: &Mutex<StatusFilter>) -> MutexGuard<'_, StatusFilter> {
    filter.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One loaded audio resource and its transport controls
///
/// After [`release`](Self::release) every operation fails with
/// [`PlaybackError::InvalidHandle`].
pub struct PlaybackSession {
    backend: Arc<dyn AudioBackend>,
    handle: BackendHandle,
    filter: Arc<Mutex<StatusFilter>>,
    playing: bool,
    released: bool,
}

impl PlaybackSession {
    /// Load a resource and bind a new session to it
    ///
    /// Nothing stays attached on failure: if the backend loaded the resource
    /// but the status subscription could not be set up, the handle is
    /// released before the error is returned.
    pub async fn load(backend: Arc<dyn AudioBackend>, resource: &str) -> Result<Self> {
        let handle = backend.load(resource).await.map_err(|e| match e {
            CoreError::Load(msg) => PlaybackError::Load(msg),
            other => PlaybackError::Load(other.to_string()),
        })?;

        let filter = Arc::new(Mutex::new(StatusFilter::default()));
        let sink = Arc::clone(&filter);
        let callback: StatusCallback = Arc::new(move |status| lock(&sink).handle(status));

        if let Err(e) = backend.subscribe(handle, callback) {
            if let Err(release_err) = backend.release(handle).await {
                warn!(%handle, error = %release_err, "Failed to release half-loaded resource");
            }
            return Err(PlaybackError::Load(format!(
                "status subscription failed: {e}"
            )));
        }

        debug!(%handle, resource, "Session loaded");

        Ok(Self {
            backend,
            handle,
            filter,
            playing: false,
            released: false,
        })
    }

    /// Backend handle this session is bound to
    pub fn handle(&self) -> BackendHandle {
        self.handle
    }

    /// Whether `play` was the last transport call
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether the session has been released
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Last position delivered to the status callback
    pub fn position(&self) -> Duration {
        lock(&self.filter).last_position.unwrap_or(Duration::ZERO)
    }

    /// Duration reported by the backend, if any
    pub fn duration(&self) -> Option<Duration> {
        lock(&self.filter).duration
    }

    /// Register the status callback, replacing any previous one
    pub fn on_status<F>(&mut self, callback: F) -> Result<()>
    where
        F: Fn(SessionEvent) + Send + Sync + 'static,
    {
        self.ensure_live()?;
        lock(&self.filter).callback = Some(Box::new(callback));
        Ok(())
    }

    /// Start or resume playback
    pub async fn play(&mut self) -> Result<()> {
        self.ensure_live()?;
        lock(&self.filter).stopped = false;
        self.backend.play(self.handle).await?;
        self.playing = true;
        Ok(())
    }

    /// Pause playback
    pub async fn pause(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.backend.pause(self.handle).await?;
        self.playing = false;
        Ok(())
    }

    /// Stop playback
    ///
    /// Suppresses any further status events, so a stopped session never
    /// reports `Finished`.
    pub async fn stop(&mut self) -> Result<()> {
        self.ensure_live()?;
        lock(&self.filter).stopped = true;
        self.playing = false;
        self.backend.stop(self.handle).await?;
        Ok(())
    }

    /// Move the playhead, keeping the play/pause state
    pub async fn seek(&mut self, position: Duration) -> Result<()> {
        self.ensure_live()?;
        {
            let mut filter = lock(&self.filter);
            if filter.unloaded {
                return Err(PlaybackError::Seek(format!(
                    "session {} is not loaded",
                    self.handle
                )));
            }
            filter.last_position = None;
        }

        self.backend
            .seek(self.handle, position)
            .await
            .map_err(|e| match e {
                CoreError::Seek(msg) => PlaybackError::Seek(msg),
                other => PlaybackError::from(other),
            })?;

        if self.playing {
            self.backend.play(self.handle).await?;
        }
        Ok(())
    }

    /// Unsubscribe and free the native resource
    ///
    /// The session counts as released even if the backend reports an error.
    pub async fn release(&mut self) -> Result<()> {
        self.ensure_live()?;
        self.released = true;
        self.playing = false;
        self.backend.unsubscribe(self.handle);
        lock(&self.filter).callback = None;
        self.backend.release(self.handle).await?;
        debug!(handle = %self.handle, "Session released");
        Ok(())
    }

    /// Stop delivering status events without touching the native resource
    ///
    /// Used when the session must be let go from a synchronous context; the
    /// caller still owes a `release`.
    pub(crate) fn detach(&self) {
        if !self.released {
            self.backend.unsubscribe(self.handle);
        }
        lock(&self.filter).callback = None;
    }

    fn ensure_live(&self) -> Result<()> {
        if self.released {
            Err(PlaybackError::InvalidHandle(self.handle.raw()))
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("handle", &self.handle)
            .field("playing", &self.playing)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}
