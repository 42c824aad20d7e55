use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;
use error_stack::{IntoReport, Report, ResultExt};

#[derive(Debug)]
pub struct ConfigError;

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Config error")
    }
}

impl std::error::Error for ConfigError {}

pub type ConfigResult<T> = error_stack::Result<T, ConfigError>;

/// `AppConfig` holds static configuration values for the application,
/// such as the Spotify endpoints and the service limits.
pub struct AppConfig;

impl AppConfig {
    pub const SPOTIFY_API_URL: &'static str = "https://api.spotify.com/v1";
    pub const SPOTIFY_AUTH_URL: &'static str = "https://accounts.spotify.com/authorize";
    pub const SPOTIFY_TOKEN_URL: &'static str = "https://accounts.spotify.com/api/token";
    pub const SPOTIFY_SCOPES: &'static [&'static str] =
        &["playlist-modify-private", "playlist-modify-public"];
    /// Must match the redirect URI registered in the Spotify developer dashboard.
    pub const OAUTH_REDIRECT_URL: &'static str = "http://127.0.0.1:8080/callback";
    pub const OAUTH_CALLBACK_ADDRESS: &'static str = "127.0.0.1:8080";
    pub const OAUTH_CALLBACK_TIMEOUT_SECS: u64 = 300;
    /// Spotify accepts at most 100 URIs per add-items call.
    pub const SPOTIFY_BATCH_CEILING: usize = 100;
    pub const YOUTUBE_API_URL: &'static str = "https://www.googleapis.com/youtube/v3";
    pub const YOUTUBE_PAGE_SIZE: u32 = 50;
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    /// Budget for reading a whole source playlist. Every page request is also bounded
    /// by `REQUEST_TIMEOUT_SECS` on its own.
    pub const SOURCE_FETCH_TIMEOUT_SECS: u64 = 600;
    pub const DIAGNOSTICS_DIR: &'static str = "logs";
    pub const TOKEN_DIR: &'static str = ".y2spot";
    pub const TOKEN_FILE: &'static str = "spotify_token.json";

    pub fn token_path() -> ConfigResult<PathBuf> {
        let home_dir = dirs::home_dir()
            .ok_or(ConfigError)
            .into_report()
            .attach_printable("Could not resolve the home directory")?;
        Ok(home_dir.join(Self::TOKEN_DIR).join(Self::TOKEN_FILE))
    }
}

/// Secrets read from the environment or a `.env` file in the working directory.
#[derive(Clone)]
pub struct Credentials {
    pub spotify_client_id: String,
    pub spotify_client_secret: String,
    pub youtube_api_key: Option<String>,
}

impl Credentials {
    pub fn load() -> ConfigResult<Self> {
        dotenv().ok();
        let spotify_client_id = Self::required_var("SPOTIFY_CLIENT_ID")?;
        let spotify_client_secret = Self::required_var("SPOTIFY_CLIENT_SECRET")?;
        let youtube_api_key = env::var("YOUTUBE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        Ok(Self {
            spotify_client_id,
            spotify_client_secret,
            youtube_api_key,
        })
    }

    pub fn youtube_api_key(&self) -> ConfigResult<String> {
        self.youtube_api_key.clone().ok_or_else(|| {
            Report::new(ConfigError)
                .attach_printable("YOUTUBE_API_KEY environment variable not set. Please add it to your .env file.")
        })
    }

    fn required_var(name: &str) -> ConfigResult<String> {
        let value = env::var(name)
            .into_report()
            .change_context(ConfigError)
            .attach_printable_lazy(|| {
                format!("{name} environment variable not set. Please create a .env file with the credentials.")
            })?;
        if value.trim().is_empty() {
            return Err(Report::new(ConfigError).attach_printable(format!("{name} is empty")));
        }
        Ok(value)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("spotify_client_id", &self.spotify_client_id)
            .field("spotify_client_secret", &"<redacted>")
            .field(
                "youtube_api_key",
                &self.youtube_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Knobs for one generation run.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorConfig {
    pub batch_ceiling: usize,
    /// Applies to every single remote call (identity, create, each search, each batch).
    pub call_timeout: Duration,
    /// Applies to the multi-page source fetch as a whole.
    pub source_timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            batch_ceiling: AppConfig::SPOTIFY_BATCH_CEILING,
            call_timeout: Duration::from_secs(AppConfig::REQUEST_TIMEOUT_SECS),
            source_timeout: Duration::from_secs(AppConfig::SOURCE_FETCH_TIMEOUT_SECS),
        }
    }
}
