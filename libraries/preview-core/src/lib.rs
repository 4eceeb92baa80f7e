//! Preview Player Core
//!
//! Platform-agnostic types, capability traits, and error handling shared by
//! the preview player crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `TrackId`
//! - **Capabilities**: `AudioBackend` (native audio), `CatalogSource` (song search)
//! - **Error Handling**: Unified `CoreError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use preview_core::{Track, TrackId};
//!
//! let track = Track::new(1_440_857_781u64, "Song", "Artist", "https://example.com/p.m4a");
//! assert_eq!(track.id, TrackId::new("1440857781"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{CoreError, Result};
pub use traits::{AudioBackend, CatalogSource};
pub use types::{BackendHandle, BackendStatus, StatusCallback, Track, TrackId};
