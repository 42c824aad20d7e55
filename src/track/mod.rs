pub mod parser;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::track::parser::parse_title;

const IDENTITY_SEPARATOR: char = '\u{1F}';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub artist: String,
    pub title: String,
}

impl Track {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }

    pub fn from_raw_title(raw_title: &str) -> Self {
        let (artist, title) = parse_title(raw_title);
        Self { artist, title }
    }

    /// Dedup key. The unit separator never shows up in video titles.
    pub fn identity_key(&self) -> String {
        format!("{}{}{}", self.artist, IDENTITY_SEPARATOR, self.title)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.artist.is_empty() {
            f.write_str(&self.title)
        } else {
            write!(f, "{} - {}", self.artist, self.title)
        }
    }
}

/// Tracks in discovery order, with repeated `(artist, title)` pairs dropped.
#[derive(Debug, Clone, Default)]
pub struct TrackList {
    tracks: Vec<Track>,
    seen: HashSet<String>,
}

impl TrackList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the track was already in the list.
    pub fn push(&mut self, track: Track) -> bool {
        if !self.seen.insert(track.identity_key()) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    pub fn push_raw_title(&mut self, raw_title: &str) -> bool {
        self.push(Track::from_raw_title(raw_title))
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Track> {
        self.tracks.iter()
    }
}

impl FromIterator<Track> for TrackList {
    fn from_iter<I: IntoIterator<Item = Track>>(iter: I) -> Self {
        let mut list = TrackList::new();
        for track in iter {
            list.push(track);
        }
        list
    }
}

impl<'a> IntoIterator for &'a TrackList {
    type Item = &'a Track;
    type IntoIter = std::slice::Iter<'a, Track>;

    fn into_iter(self) -> Self::IntoIter {
        self.tracks.iter()
    }
}
