/// External capabilities the preview player consumes
///
/// Neither is implemented here: the platform's native audio subsystem provides
/// the [`AudioBackend`], and a search service provides the [`CatalogSource`].
use crate::error::Result;
use crate::types::{BackendHandle, StatusCallback, Track};
use async_trait::async_trait;
use std::time::Duration;

/// Native audio backend
///
/// Every handle returned by [`load`](Self::load) stays valid until
/// [`release`](Self::release); operations on a released handle fail with
/// [`CoreError::InvalidHandle`](crate::CoreError::InvalidHandle).
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Fetch and decode a resource
    ///
    /// # Errors
    /// Returns `CoreError::Load` if the resource cannot be fetched or decoded
    async fn load(&self, resource: &str) -> Result<BackendHandle>;

    /// Start or resume playback
    async fn play(&self, handle: BackendHandle) -> Result<()>;

    /// Pause playback, keeping the playhead
    async fn pause(&self, handle: BackendHandle) -> Result<()>;

    /// Stop playback
    ///
    /// A stopped resource never reports a natural end.
    async fn stop(&self, handle: BackendHandle) -> Result<()>;

    /// Free the native resources behind the handle
    async fn release(&self, handle: BackendHandle) -> Result<()>;

    /// Move the playhead
    async fn seek(&self, handle: BackendHandle, position: Duration) -> Result<()>;

    /// Register the status callback for a handle, replacing any previous one
    fn subscribe(&self, handle: BackendHandle, callback: StatusCallback) -> Result<()>;

    /// Drop the status callback for a handle
    fn unsubscribe(&self, handle: BackendHandle);
}

/// Song catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Search the catalog by free text
    ///
    /// # Errors
    /// Returns `CoreError::Network` when the catalog cannot be reached
    async fn search(&self, query: &str) -> Result<Vec<Track>>;
}
