//! Types exchanged with the native audio backend

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Opaque handle to a resource loaded by an [`AudioBackend`](crate::AudioBackend)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendHandle(u64);

impl BackendHandle {
    /// Wrap a backend-assigned handle value
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw handle value
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BackendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Raw transport status as reported by the native audio subsystem
///
/// Mirrors what mobile audio stacks deliver on every status tick: whether the
/// resource is loaded, whether it is currently producing sound, the playhead,
/// the duration once known, and a one-shot flag set on the tick where the
/// resource played to its natural end.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BackendStatus {
    /// Resource is loaded and addressable
    pub is_loaded: bool,

    /// Audio is currently playing
    pub is_playing: bool,

    /// Current playhead
    pub position: Duration,

    /// Total duration, once the backend knows it
    pub duration: Option<Duration>,

    /// Set on the tick where playback reached the natural end of the resource
    pub did_just_finish: bool,
}

impl BackendStatus {
    /// Status tick for a loaded resource
    pub fn loaded(is_playing: bool, position: Duration, duration: Option<Duration>) -> Self {
        Self {
            is_loaded: true,
            is_playing,
            position,
            duration,
            did_just_finish: false,
        }
    }

    /// Status tick for a resource that just played to its end
    pub fn finished(duration: Duration) -> Self {
        Self {
            is_loaded: true,
            is_playing: false,
            position: duration,
            duration: Some(duration),
            did_just_finish: true,
        }
    }
}

/// Callback registered with the backend for status ticks
///
/// Backends may invoke it from any thread, including concurrently.
pub type StatusCallback = Arc<dyn Fn(BackendStatus) + Send + Sync + 'static>;
