use std::fmt;

use async_trait::async_trait;

use crate::playlist::PlaylistSpec;

pub mod client;

#[derive(Debug)]
pub struct SpotifyError;

impl fmt::Display for SpotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Spotify error")
    }
}

impl std::error::Error for SpotifyError {}

pub type SpotifyResult<T> = error_stack::Result<T, SpotifyError>;

/// The operations the generator needs from the destination service.
#[async_trait]
pub trait PlaylistDestination: Send + Sync {
    async fn current_user_id(&self) -> SpotifyResult<String>;

    async fn create_playlist(&self, user_id: &str, spec: &PlaylistSpec) -> SpotifyResult<String>;

    /// Top-ranked track URI for the pair, `None` when the catalog has no match.
    async fn search_track(&self, artist: &str, title: &str) -> SpotifyResult<Option<String>>;

    /// Appends at most one batch of URIs and returns how many were added.
    async fn append_tracks(&self, playlist_id: &str, uris: &[String]) -> SpotifyResult<usize>;
}
