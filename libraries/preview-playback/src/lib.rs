//! Preview Player - Playback Coordination
//!
//! Platform-agnostic playback core for a music-preview player.
//!
//! This crate provides:
//! - `PlaybackSession`: one loaded resource, its transport, and ordered status events
//! - `PlaylistEngine`: duplicate-free ordered playlist with next/previous/auto-advance
//! - `PlaybackCoordinator`: one live session at a time, drop-if-busy starts,
//!   auto-advance on natural end, observable snapshots
//! - `SearchService`: debounced catalog search that never fails the caller
//! - `PlayerConfig`: layered configuration (file + environment)
//!
//! # Architecture
//!
//! `preview-playback` implements no audio or networking itself. The native
//! audio stack is reached through [`preview_core::AudioBackend`] and the song
//! catalog through [`preview_core::CatalogSource`].
//!
//! # Example: Playlist
//!
//! ```rust
//! use preview_playback::PlaylistEngine;
//! use preview_core::{Track, TrackId};
//!
//! let mut playlist = PlaylistEngine::new();
//! for id in ["a", "b", "c"] {
//!     playlist.add(Track::new(id, id, "Artist", format!("https://cdn/{id}.m4a")));
//! }
//!
//! // "b" finishes: it is consumed and the track now at its index plays next
//! let next = playlist.advance_after_finish(&TrackId::new("b"));
//! assert_eq!(next.unwrap().id, TrackId::new("c"));
//! assert_eq!(playlist.len(), 2);
//! ```
//!
//! # Example: Coordinator
//!
//! ```rust,ignore
//! use preview_playback::{PlaybackCoordinator, PlayerConfig};
//!
//! let coordinator = PlaybackCoordinator::new(backend, PlayerConfig::load()?);
//! let mut state = coordinator.watch_state();
//!
//! coordinator.play_track(track).await?;
//! coordinator.pause().await?;
//! coordinator.seek_to(12.0).await?;
//! coordinator.resume().await?;
//!
//! state.changed().await?;
//! println!("{:?}", *state.borrow());
//! ```

mod config;
mod coordinator;
mod error;
mod events;
mod playlist;
mod search;
mod session;
mod shuffle;
pub mod types;

// Public exports
pub use config::{PlayerConfig, DEFAULT_CONFIG_FILE};
pub use coordinator::PlaybackCoordinator;
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use playlist::PlaylistEngine;
pub use search::{SearchResults, SearchService};
pub use session::{PlaybackSession, SessionCallback, SessionEvent};
pub use shuffle::{shuffle_tracks, shuffle_tracks_with};
pub use types::{format_clock, PlayOutcome, PlaybackState, SessionStatus};
