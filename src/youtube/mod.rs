use std::fmt;

use async_trait::async_trait;

use crate::track::TrackList;

pub mod client;

#[derive(Debug)]
pub struct YoutubeError;

impl fmt::Display for YoutubeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("YouTube error")
    }
}

impl std::error::Error for YoutubeError {}

pub type YoutubeResult<T> = error_stack::Result<T, YoutubeError>;

/// Where the tracks of a run come from.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Deduplicated tracks in playlist order. An empty playlist is an error.
    async fn fetch_playlist_tracks(&self, playlist_url: &str) -> YoutubeResult<TrackList>;
}
