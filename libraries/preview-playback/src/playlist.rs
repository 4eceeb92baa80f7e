//! Ad-hoc playlist
//!
//! Insertion-ordered, duplicate-free list of tracks. Order defines adjacency
//! for next/previous, and the engine decides what plays after a finish.
//!
//! ```text
//! [A, B, C]   B finishes at index 1
//! [A, C]      B is consumed; index 1 now holds C -> next = C
//!
//! [A, B, C]   C finishes at index 2
//! [A, B]      index 2 is past the end -> wrap to A
//! ```

use crate::shuffle::{shuffle_tracks, shuffle_tracks_with};
use preview_core::{Track, TrackId};
use rand::Rng;

/// Ordered playlist with next/previous/auto-advance decisions
#[derive(Debug, Clone, Default)]
pub struct PlaylistEngine {
    tracks: Vec<Track>,
}

impl PlaylistEngine {
    /// Create new empty playlist
    pub fn new() -> Self {
        Self { tracks: Vec::new() }
    }

    /// Append a track unless its id is already present
    ///
    /// Returns `true` if the track was appended.
    pub fn add(&mut self, track: Track) -> bool {
        if self.contains(&track.id) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    /// Remove the track with the given id, if present
    pub fn remove(&mut self, track_id: &TrackId) -> Option<Track> {
        let index = self.index_of(track_id)?;
        Some(self.tracks.remove(index))
    }

    /// Remove the track if present, otherwise add it
    ///
    /// Returns whether the track is in the playlist afterwards.
    pub fn toggle(&mut self, track: Track) -> bool {
        if self.remove(&track.id).is_some() {
            false
        } else {
            self.tracks.push(track);
            true
        }
    }

    /// Empty the playlist
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Randomize order in place
    pub fn shuffle(&mut self) {
        shuffle_tracks(&mut self.tracks);
    }

    /// Randomize order in place with a caller-provided RNG
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        shuffle_tracks_with(&mut self.tracks, rng);
    }

    /// Whether a track with this id is present
    pub fn contains(&self, track_id: &TrackId) -> bool {
        self.tracks.iter().any(|t| &t.id == track_id)
    }

    /// Position of the track with this id
    pub fn index_of(&self, track_id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == track_id)
    }

    /// Track that follows `current_id`
    ///
    /// Wraps from the last track to the first. An unknown id starts over at
    /// the first track. `None` only when the playlist is empty.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self, current_id: Option<&TrackId>) -> Option<Track> {
        match current_id.and_then(|id| self.index_of(id)) {
            Some(index) if index + 1 < self.tracks.len() => self.tracks.get(index + 1).cloned(),
            _ => self.tracks.first().cloned(),
        }
    }

    /// Track that precedes `current_id`
    ///
    /// From the first track, or for an unknown id, wraps to the last track.
    pub fn previous(&self, current_id: Option<&TrackId>) -> Option<Track> {
        match current_id.and_then(|id| self.index_of(id)) {
            Some(index) if index > 0 => self.tracks.get(index - 1).cloned(),
            _ => self.tracks.last().cloned(),
        }
    }

    /// Auto-advance target after the finished track was removed
    ///
    /// `index_before_removal` is where the finished track sat before it was
    /// consumed. The track now occupying that index plays next; past the end
    /// (or for an unknown index) playback wraps to the first track.
    pub fn next_after_removal(&self, index_before_removal: Option<usize>) -> Option<Track> {
        match index_before_removal {
            Some(index) if index < self.tracks.len() => self.tracks.get(index).cloned(),
            _ => self.tracks.first().cloned(),
        }
    }

    /// Consume a finished track and pick what plays next
    pub fn advance_after_finish(&mut self, finished_id: &TrackId) -> Option<Track> {
        let index = self.index_of(finished_id);
        self.remove(finished_id);
        self.next_after_removal(index)
    }

    /// Tracks in play order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Owned copy of the tracks, for publishing to observers
    pub fn snapshot(&self) -> Vec<Track> {
        self.tracks.clone()
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if playlist is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn create_test_track(id: &str) -> Track {
        Track::new(id, format!("Track {id}"), "Test Artist", format!("https://cdn/{id}.m4a"))
    }

    fn playlist_of(ids: &[&str]) -> PlaylistEngine {
        let mut playlist = PlaylistEngine::new();
        for id in ids {
            playlist.add(create_test_track(id));
        }
        playlist
    }

    fn ids(playlist: &PlaylistEngine) -> Vec<&str> {
        playlist.tracks().iter().map(|t| t.id.as_str()).collect()
    }

    fn id(s: &str) -> TrackId {
        TrackId::new(s)
    }

    #[test]
    fn create_empty_playlist() {
        let playlist = PlaylistEngine::new();
        assert_eq!(playlist.len(), 0);
        assert!(playlist.is_empty());
        assert_eq!(playlist.next(None), None);
        assert_eq!(playlist.previous(None), None);
    }

    #[test]
    fn add_keeps_insertion_order() {
        let playlist = playlist_of(&["a", "b", "c"]);
        assert_eq!(ids(&playlist), vec!["a", "b", "c"]);
    }

    #[test]
    fn adding_present_track_is_noop() {
        let mut playlist = playlist_of(&["a", "b"]);
        let added = playlist.add(create_test_track("a"));

        assert!(!added);
        assert_eq!(ids(&playlist), vec!["a", "b"]);
    }

    #[test]
    fn remove_absent_is_noop() {
        let mut playlist = playlist_of(&["a", "b"]);
        assert!(playlist.remove(&id("zzz")).is_none());
        assert_eq!(playlist.len(), 2);
    }

    #[test]
    fn remove_maintains_order() {
        let mut playlist = playlist_of(&["a", "b", "c"]);
        let removed = playlist.remove(&id("b")).unwrap();

        assert_eq!(removed.id, id("b"));
        assert_eq!(ids(&playlist), vec!["a", "c"]);
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut playlist = PlaylistEngine::new();
        assert!(playlist.toggle(create_test_track("a")));
        assert!(playlist.contains(&id("a")));
        assert!(!playlist.toggle(create_test_track("a")));
        assert!(!playlist.contains(&id("a")));
    }

    #[test]
    fn clear_playlist() {
        let mut playlist = playlist_of(&["a", "b"]);
        playlist.clear();
        assert!(playlist.is_empty());
    }

    #[test]
    fn shuffle_keeps_same_ids() {
        let mut playlist = playlist_of(&["a", "b", "c", "d", "e"]);
        playlist.shuffle();

        let set: HashSet<&str> = ids(&playlist).into_iter().collect();
        assert_eq!(set, ["a", "b", "c", "d", "e"].into_iter().collect());
    }

    #[test]
    fn next_moves_forward_and_wraps() {
        let playlist = playlist_of(&["a", "b", "c"]);
        assert_eq!(playlist.next(Some(&id("a"))).unwrap().id, id("b"));
        assert_eq!(playlist.next(Some(&id("b"))).unwrap().id, id("c"));
        assert_eq!(playlist.next(Some(&id("c"))).unwrap().id, id("a"));
    }

    #[test]
    fn next_from_unknown_starts_at_first() {
        let playlist = playlist_of(&["a", "b", "c"]);
        assert_eq!(playlist.next(Some(&id("gone"))).unwrap().id, id("a"));
        assert_eq!(playlist.next(None).unwrap().id, id("a"));
    }

    #[test]
    fn previous_moves_back_and_wraps() {
        let playlist = playlist_of(&["a", "b", "c"]);
        assert_eq!(playlist.previous(Some(&id("c"))).unwrap().id, id("b"));
        assert_eq!(playlist.previous(Some(&id("b"))).unwrap().id, id("a"));
        assert_eq!(playlist.previous(Some(&id("a"))).unwrap().id, id("c"));
        assert_eq!(playlist.previous(Some(&id("gone"))).unwrap().id, id("c"));
    }

    #[test]
    fn finishing_middle_track_plays_the_one_after_it() {
        let mut playlist = playlist_of(&["a", "b", "c"]);
        let next = playlist.advance_after_finish(&id("b"));

        assert_eq!(ids(&playlist), vec!["a", "c"]);
        assert_eq!(next.unwrap().id, id("c"));
    }

    #[test]
    fn finishing_last_track_wraps_to_first() {
        let mut playlist = playlist_of(&["a", "b", "c"]);
        let next = playlist.advance_after_finish(&id("c"));

        assert_eq!(ids(&playlist), vec!["a", "b"]);
        assert_eq!(next.unwrap().id, id("a"));
    }

    #[test]
    fn finishing_only_track_leaves_nothing() {
        let mut playlist = playlist_of(&["a"]);
        assert!(playlist.advance_after_finish(&id("a")).is_none());
        assert!(playlist.is_empty());
    }

    #[test]
    fn finishing_track_outside_playlist_starts_at_first() {
        let mut playlist = playlist_of(&["a", "b"]);
        let next = playlist.advance_after_finish(&id("x"));

        assert_eq!(ids(&playlist), vec!["a", "b"]);
        assert_eq!(next.unwrap().id, id("a"));
    }
}
