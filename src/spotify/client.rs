use std::time::Duration;

use async_trait::async_trait;
use error_stack::{IntoReport, Report, ResultExt};
use log::debug;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::playlist::PlaylistSpec;
use crate::spotify::{PlaylistDestination, SpotifyError, SpotifyResult};

#[derive(Deserialize, Debug)]
struct ApiUser {
    id: String,
}

#[derive(Serialize, Debug)]
struct CreatePlaylistRequest<'a> {
    name: &'a str,
    description: &'a str,
    public: bool,
}

#[derive(Deserialize, Debug)]
struct ApiPlaylist {
    id: String,
}

#[derive(Deserialize, Debug)]
struct ApiTrack {
    uri: String,
}

#[derive(Deserialize, Debug)]
struct ApiTrackPage {
    items: Vec<ApiTrack>,
}

#[derive(Deserialize, Debug)]
struct SearchResponse {
    tracks: ApiTrackPage,
}

#[derive(Serialize, Debug)]
struct AddTracksRequest<'a> {
    uris: &'a [String],
}

/// Authorized access to the Spotify Web API.
///
/// Built from a fresh access token by `SpotifyAuth::authorized_client`, then handed
/// to the generator. Nothing here refreshes credentials on its own.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    access_token: String,
    base_url: String,
}

impl SpotifyClient {
    pub fn new(access_token: String) -> SpotifyResult<Self> {
        Self::with_base_url(access_token, AppConfig::SPOTIFY_API_URL.to_string())
    }

    pub fn with_base_url(access_token: String, base_url: String) -> SpotifyResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(AppConfig::REQUEST_TIMEOUT_SECS))
            .build()
            .into_report()
            .change_context(SpotifyError)?;
        Ok(Self {
            http,
            access_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn search_query(artist: &str, title: &str) -> String {
        if artist.is_empty() {
            format!("track:{title}")
        } else {
            format!("track:{title} artist:{artist}")
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send(
        &self,
        request: RequestBuilder,
        expected: StatusCode,
        action: &str,
    ) -> SpotifyResult<Response> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|err| failure(action, err))?;
        let status = response.status();
        if status != expected {
            let body = response.text().await.unwrap_or_default();
            debug!("Spotify answered {status} to {action}: {body}");
            return Err(Report::new(SpotifyError).attach_printable(format!(
                "failed to {action}: {status}"
            )));
        }
        Ok(response)
    }
}

/// Keeps the transport or decode error text in the printable attachment, which is
/// what ends up as the reason of an unresolved track.
fn failure(action: &str, err: reqwest::Error) -> Report<SpotifyError> {
    let mut message = format!("failed to {action}: {err}");
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(&format!(": {cause_text}"));
        }
        source = cause.source();
    }
    Report::new(err)
        .change_context(SpotifyError)
        .attach_printable(message)
}

#[async_trait]
impl PlaylistDestination for SpotifyClient {
    async fn current_user_id(&self) -> SpotifyResult<String> {
        let request = self.http.get(self.endpoint("/me"));
        let user = self
            .send(request, StatusCode::OK, "get current user")
            .await?
            .json::<ApiUser>()
            .await
            .map_err(|err| failure("get current user", err))?;
        Ok(user.id)
    }

    async fn create_playlist(&self, user_id: &str, spec: &PlaylistSpec) -> SpotifyResult<String> {
        let body = CreatePlaylistRequest {
            name: &spec.name,
            description: &spec.description,
            public: spec.is_public(),
        };
        let request = self
            .http
            .post(self.endpoint(&format!("/users/{user_id}/playlists")))
            .json(&body);
        let playlist = self
            .send(request, StatusCode::CREATED, "create playlist")
            .await?
            .json::<ApiPlaylist>()
            .await
            .map_err(|err| failure("create playlist", err))?;
        Ok(playlist.id)
    }

    async fn search_track(&self, artist: &str, title: &str) -> SpotifyResult<Option<String>> {
        let query = Self::search_query(artist, title);
        let request = self.http.get(self.endpoint("/search")).query(&[
            ("q", query.as_str()),
            ("type", "track"),
            ("limit", "1"),
        ]);
        let search = self
            .send(request, StatusCode::OK, "search track")
            .await?
            .json::<SearchResponse>()
            .await
            .map_err(|err| failure("search track", err))?;
        Ok(search.tracks.items.into_iter().next().map(|track| track.uri))
    }

    async fn append_tracks(&self, playlist_id: &str, uris: &[String]) -> SpotifyResult<usize> {
        let request = self
            .http
            .post(self.endpoint(&format!("/playlists/{playlist_id}/tracks")))
            .json(&AddTracksRequest { uris });
        self.send(request, StatusCode::CREATED, "add tracks to playlist")
            .await?;
        Ok(uris.len())
    }
}
