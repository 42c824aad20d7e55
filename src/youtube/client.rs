use std::time::Duration;

use async_trait::async_trait;
use error_stack::{IntoReport, Report, ResultExt};
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::config::AppConfig;
use crate::track::TrackList;
use crate::validation::youtube_playlist_id;
use crate::youtube::{TrackSource, YoutubeError, YoutubeResult};

/// Titles YouTube shows for entries that are no longer playable.
const PLACEHOLDER_TITLES: &[&str] = &["Deleted video", "Private video"];

#[derive(Deserialize, Debug)]
struct Snippet {
    title: String,
}

#[derive(Deserialize, Debug)]
struct PlaylistItem {
    snippet: Snippet,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct YoutubeClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl YoutubeClient {
    pub fn new(api_key: String) -> YoutubeResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(AppConfig::REQUEST_TIMEOUT_SECS))
            .build()
            .into_report()
            .change_context(YoutubeError)?;
        Ok(Self {
            http,
            api_key,
            base_url: AppConfig::YOUTUBE_API_URL.to_string(),
        })
    }

    pub fn playlist_id_from_url(playlist_url: &str) -> YoutubeResult<String> {
        let parsed = Url::parse(playlist_url.trim())
            .into_report()
            .change_context(YoutubeError)
            .attach_printable("invalid YouTube URL".to_string())?;
        youtube_playlist_id(&parsed).ok_or_else(|| {
            Report::new(YoutubeError)
                .attach_printable("only playlist URLs with 'list' param are supported".to_string())
        })
    }

    async fn fetch_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
    ) -> YoutubeResult<PlaylistItemsPage> {
        let page_size = AppConfig::YOUTUBE_PAGE_SIZE.to_string();
        let mut query = vec![
            ("part", "snippet"),
            ("playlistId", playlist_id),
            ("maxResults", page_size.as_str()),
            ("key", self.api_key.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }
        let response = self
            .http
            .get(format!("{}/playlistItems", self.base_url))
            .query(&query)
            .send()
            .await
            .into_report()
            .change_context(YoutubeError)
            .attach_printable("failed to fetch playlist items".to_string())?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(Report::new(YoutubeError)
                .attach_printable(format!("failed to fetch playlist items: {status}")));
        }
        response
            .json::<PlaylistItemsPage>()
            .await
            .into_report()
            .change_context(YoutubeError)
            .attach_printable("failed to decode playlist items".to_string())
    }
}

/// Parses one page of items into `tracks`, skipping placeholders and repeats.
fn collect_page(tracks: &mut TrackList, items: Vec<PlaylistItem>) -> usize {
    let mut added = 0;
    for item in items {
        let raw_title = item.snippet.title.trim();
        if raw_title.is_empty() || PLACEHOLDER_TITLES.contains(&raw_title) {
            debug!("Skipping unavailable playlist entry \"{raw_title}\"");
            continue;
        }
        if tracks.push_raw_title(raw_title) {
            added += 1;
            info!("Added \"{raw_title}\" to track list");
        }
    }
    added
}

#[async_trait]
impl TrackSource for YoutubeClient {
    async fn fetch_playlist_tracks(&self, playlist_url: &str) -> YoutubeResult<TrackList> {
        let playlist_id = Self::playlist_id_from_url(playlist_url)?;
        let mut tracks = TrackList::new();
        let mut page_token: Option<String> = None;
        loop {
            info!("Fetching YouTube playlist page...");
            let page = self.fetch_page(&playlist_id, page_token.as_deref()).await?;
            collect_page(&mut tracks, page.items);
            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) => page_token = Some(token),
                None => {
                    info!("End of YouTube playlist");
                    break;
                }
            }
        }
        if tracks.is_empty() {
            return Err(Report::new(YoutubeError)
                .attach_printable("no valid tracks found".to_string()));
        }
        Ok(tracks)
    }
}
