/// Core error types for the preview player
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors reported by the external capabilities the core consumes
#[derive(Error, Debug)]
pub enum CoreError {
    /// Catalog search failed
    #[error("Network error: {0}")]
    Network(String),

    /// Resource could not be fetched or decoded
    #[error("Load error: {0}")]
    Load(String),

    /// Seek against a resource that is not loaded
    #[error("Seek error: {0}")]
    Seek(String),

    /// Operation against a handle that was released or never existed
    #[error("Invalid handle: {0}")]
    InvalidHandle(u64),

    /// Any other native audio failure
    #[error("Audio backend error: {0}")]
    Backend(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a load error
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Create a seek error
    pub fn seek(msg: impl Into<String>) -> Self {
        Self::Seek(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}
