mod backend;
mod ids;
mod track;

pub use backend::{BackendHandle, BackendStatus, StatusCallback};
pub use ids::TrackId;
pub use track::Track;
