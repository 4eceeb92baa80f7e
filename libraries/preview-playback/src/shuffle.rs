//! Playlist randomization
//!
//! Pure random shuffle (Fisher-Yates via `SliceRandom`). Every permutation is
//! equally likely, fixed points included.

use preview_core::Track;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

/// Shuffle tracks in place with the thread-local RNG
pub fn shuffle_tracks(tracks: &mut [Track]) {
    shuffle_tracks_with(tracks, &mut thread_rng());
}

/// Shuffle tracks in place with a caller-provided RNG
pub fn shuffle_tracks_with<R: Rng + ?Sized>(tracks: &mut [Track], rng: &mut R) {
    if tracks.len() <= 1 {
        return;
    }
    tracks.shuffle(rng);
}
