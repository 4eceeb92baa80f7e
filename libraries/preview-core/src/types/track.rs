/// Track domain type
use super::ids::TrackId;
use serde::{Deserialize, Serialize};

/// A playable preview returned by a catalog
///
/// Immutable once retrieved; the playlist and the coordinator hand out clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Stable identifier, unique within a result set and across the playlist
    pub id: TrackId,

    /// Display title
    pub title: String,

    /// Display artist
    pub artist: String,

    /// Playable resource reference (URI/URL of the preview clip)
    pub preview_url: String,

    /// Artwork reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_url: Option<String>,
}

impl Track {
    /// Create a track without artwork
    pub fn new(
        id: impl Into<TrackId>,
        title: impl Into<String>,
        artist: impl Into<String>,
        preview_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            preview_url: preview_url.into(),
            artwork_url: None,
        }
    }

    /// Attach an artwork reference
    #[must_use]
    pub fn with_artwork(mut self, artwork_url: impl Into<String>) -> Self {
        self.artwork_url = Some(artwork_url.into());
        self
    }
}
