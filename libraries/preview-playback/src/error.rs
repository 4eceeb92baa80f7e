//! Error types for playback management

use preview_core::CoreError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Resource could not be loaded
    #[error("Failed to load track: {0}")]
    Load(String),

    /// Seek against a session that is not loaded
    #[error("Seek failed: {0}")]
    Seek(String),

    /// Operation against a released session
    #[error("Session {0} has been released")]
    InvalidHandle(u64),

    /// Native audio failure outside the categories above
    #[error("Audio backend error: {0}")]
    Backend(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a core capability that has no playback-specific meaning
    #[error(transparent)]
    Core(CoreError),
}

impl PlaybackError {
    /// Whether the error only means the targeted session is gone or not ready
    ///
    /// These are recovered as no-ops by the coordinator.
    pub fn is_stale_session(&self) -> bool {
        matches!(self, Self::Seek(_) | Self::InvalidHandle(_))
    }
}

impl From<CoreError> for PlaybackError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Load(msg) => Self::Load(msg),
            CoreError::Seek(msg) => Self::Seek(msg),
            CoreError::InvalidHandle(handle) => Self::InvalidHandle(handle),
            CoreError::Backend(msg) => Self::Backend(msg),
            other => Self::Core(other),
        }
    }
}

impl From<config::ConfigError> for PlaybackError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_playback_kinds() {
        assert!(matches!(
            PlaybackError::from(CoreError::load("404")),
            PlaybackError::Load(_)
        ));
        assert!(matches!(
            PlaybackError::from(CoreError::InvalidHandle(3)),
            PlaybackError::InvalidHandle(3)
        ));
        assert!(matches!(
            PlaybackError::from(CoreError::network("offline")),
            PlaybackError::Core(CoreError::Network(_))
        ));
    }

    #[test]
    fn stale_session_errors() {
        assert!(PlaybackError::Seek("not loaded".into()).is_stale_session());
        assert!(PlaybackError::InvalidHandle(1).is_stale_session());
        assert!(!PlaybackError::Load("bad".into()).is_stale_session());
    }
}
