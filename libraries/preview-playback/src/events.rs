//! Playback Events
//!
//! Event-based communication for UI synchronization. Events are emitted at
//! key points:
//! - Session status changes (loading/playing/paused/idle)
//! - Track changes (a new session starts, or the player closes)
//! - Natural end of a track
//! - Position updates (every backend tick, and after seeks)
//! - Playlist mutations
//! - Errors surfaced to the user

use crate::types::SessionStatus;
use preview_core::TrackId;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Session status changed
    StateChanged {
        /// The new status
        state: SessionStatus,
    },

    /// Active track changed
    TrackChanged {
        /// ID of the new active track (`None` when the player closed)
        track_id: Option<TrackId>,
        /// ID of the previous active track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished {
        /// ID of the finished track
        track_id: TrackId,
    },

    /// Position update
    PositionUpdate {
        /// Current playback position
        position_ms: u64,
        /// Total track duration
        duration_ms: u64,
    },

    /// Playlist changed (tracks added/removed/reordered)
    PlaylistChanged {
        /// New playlist length
        length: usize,
    },

    /// Error occurred during playback
    Error {
        /// Error message
        message: String,
    },
}

impl PlaybackEvent {
    /// Position update from seconds
    pub fn position(position_secs: f64, duration_secs: f64) -> Self {
        Self::PositionUpdate {
            position_ms: secs_to_ms(position_secs),
            duration_ms: secs_to_ms(duration_secs),
        }
    }
}

fn secs_to_ms(secs: f64) -> u64 {
    if secs.is_finite() && secs > 0.0 {
        (secs * 1000.0).round() as u64
    } else {
        0
    }
}
