//! Core types for playback management

use preview_core::Track;
use serde::{Deserialize, Serialize};

/// Status of the live session as seen by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionStatus {
    /// No session, no active track
    #[default]
    Idle,

    /// Resource is being fetched/decoded
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Reached the natural end, auto-advance pending
    Finished,
}

impl SessionStatus {
    /// Whether a session is bound (anything but `Idle`)
    pub fn has_session(self) -> bool {
        self != Self::Idle
    }
}

/// Snapshot of what the player is doing
///
/// `status == Idle` always comes with `active_track == None`. Once the backend
/// reports a duration, `position_secs` stays within `[0, duration_secs]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Track bound to the live session
    pub active_track: Option<Track>,

    /// Session status
    pub status: SessionStatus,

    /// Playhead in seconds
    pub position_secs: f64,

    /// Track length in seconds (configured preview length until known)
    pub duration_secs: f64,
}

impl PlaybackState {
    /// Idle state with the given assumed duration
    pub fn idle(duration_secs: f64) -> Self {
        Self {
            active_track: None,
            status: SessionStatus::Idle,
            position_secs: 0.0,
            duration_secs,
        }
    }

    /// Whether audio is currently playing
    pub fn is_playing(&self) -> bool {
        self.status == SessionStatus::Playing
    }

    /// Id of the active track, if any
    pub fn active_track_id(&self) -> Option<&preview_core::TrackId> {
        self.active_track.as_ref().map(|t| &t.id)
    }
}

/// What happened to a `play_track` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The new session is playing
    Started,

    /// Another start was in flight; this request was ignored
    Dropped,
}

/// Format seconds as `m:ss` for the player panel
pub fn format_clock(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
