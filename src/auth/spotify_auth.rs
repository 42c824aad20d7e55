use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use colored::Colorize;
use error_stack::{IntoReport, Report, ResultExt};
use log::info;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, RefreshToken,
    Scope, TokenResponse, TokenUrl,
};
use tokio_util::sync::CancellationToken;

use super::callback::CallbackListener;
use super::{AuthError, AuthResult, StoredToken};
use crate::config::{AppConfig, Credentials};
use crate::spotify::client::SpotifyClient;

/// Reads and writes the persisted Spotify token.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> AuthResult<Self> {
        let path = AppConfig::token_path().change_context(AuthError)?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> AuthResult<StoredToken> {
        let token_json = fs::read_to_string(&self.path)
            .into_report()
            .change_context(AuthError)
            .attach_printable_lazy(|| format!("Could not read {}", self.path.display()))?;
        serde_json::from_str(&token_json)
            .into_report()
            .change_context(AuthError)
            .attach_printable("The stored token is corrupted, please login again".to_string())
    }

    pub fn save(&self, token: &StoredToken) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .into_report()
                .change_context(AuthError)?;
        }
        let token_json = serde_json::to_string_pretty(token)
            .into_report()
            .change_context(AuthError)?;
        fs::write(&self.path, token_json)
            .into_report()
            .change_context(AuthError)
            .attach_printable_lazy(|| format!("Could not write {}", self.path.display()))
    }

    /// Returns whether there was a token to delete.
    pub fn delete(&self) -> AuthResult<bool> {
        if !self.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.path)
            .into_report()
            .change_context(AuthError)?;
        Ok(true)
    }
}

/// Spotify authorization-code flow plus token refresh.
pub struct SpotifyAuth {
    client: BasicClient,
    store: TokenStore,
}

impl SpotifyAuth {
    pub fn new(credentials: &Credentials) -> AuthResult<Self> {
        let store = TokenStore::default_location()?;
        Self::with_store(credentials, store)
    }

    pub fn with_store(credentials: &Credentials, store: TokenStore) -> AuthResult<Self> {
        let client = BasicClient::new(
            ClientId::new(credentials.spotify_client_id.clone()),
            Some(ClientSecret::new(credentials.spotify_client_secret.clone())),
            AuthUrl::new(AppConfig::SPOTIFY_AUTH_URL.to_string())
                .into_report()
                .change_context(AuthError)?,
            Some(
                TokenUrl::new(AppConfig::SPOTIFY_TOKEN_URL.to_string())
                    .into_report()
                    .change_context(AuthError)?,
            ),
        )
        .set_redirect_uri(
            RedirectUrl::new(AppConfig::OAUTH_REDIRECT_URL.to_string())
                .into_report()
                .change_context(AuthError)?,
        );
        Ok(Self { client, store })
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.exists()
    }

    pub async fn login(&self, cancel: &CancellationToken) -> AuthResult<StoredToken> {
        let (auth_url, csrf_token) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scopes(
                AppConfig::SPOTIFY_SCOPES
                    .iter()
                    .map(|scope| Scope::new(scope.to_string())),
            )
            .url();

        // bind before opening the browser so the redirect cannot arrive first
        let listener = CallbackListener::bind(AppConfig::OAUTH_CALLBACK_ADDRESS)?;

        println!("{}", "🌐 Please log in to Spotify in your browser.".cyan());
        println!(
            "If the browser doesn't open, visit: {}",
            auth_url.to_string().blue()
        );
        if webbrowser::open(auth_url.as_str()).is_err() {
            println!("{}", "Failed to open browser automatically".yellow());
        }

        let code = listener
            .wait_for_code(
                csrf_token.secret(),
                Duration::from_secs(AppConfig::OAUTH_CALLBACK_TIMEOUT_SECS),
                cancel,
            )
            .await?;

        info!("Exchanging authorization code for an access token");
        let response = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(async_http_client)
            .await
            .map_err(|err| {
                Report::new(AuthError).attach_printable(format!("token exchange failed: {err}"))
            })?;
        let token = Self::stored_token(&response, None);
        self.store.save(&token)?;
        Ok(token)
    }

    /// Loads the stored token, refreshing it when it is about to expire, and wraps it
    /// in a ready-to-use API client.
    pub async fn authorized_client(&self) -> AuthResult<SpotifyClient> {
        let token = self.fresh_token().await?;
        SpotifyClient::new(token.access_token).change_context(AuthError)
    }

    pub fn logout(&self) -> AuthResult<bool> {
        self.store.delete()
    }

    async fn fresh_token(&self) -> AuthResult<StoredToken> {
        let token = self
            .store
            .load()
            .attach_printable("Run `y2spot login` first")?;
        if !token.needs_refresh(Utc::now()) {
            return Ok(token);
        }
        let refresh_token = token.refresh_token.clone().ok_or_else(|| {
            Report::new(AuthError)
                .attach_printable("The token expired and cannot be refreshed, please login again".to_string())
        })?;
        info!("Refreshing the Spotify access token");
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .request_async(async_http_client)
            .await
            .map_err(|err| {
                Report::new(AuthError).attach_printable(format!("token refresh failed: {err}"))
            })?;
        let refreshed = Self::stored_token(&response, Some(refresh_token));
        if refreshed.access_token != token.access_token {
            self.store.save(&refreshed)?;
        }
        Ok(refreshed)
    }

    fn stored_token(response: &BasicTokenResponse, previous_refresh: Option<String>) -> StoredToken {
        let expires_in = response
            .expires_in()
            .map(|duration| duration.as_secs() as i64)
            .unwrap_or(3600);
        StoredToken {
            access_token: response.access_token().secret().to_string(),
            // Spotify may omit the refresh token on refresh, keep the previous one then
            refresh_token: response
                .refresh_token()
                .map(|token| token.secret().to_string())
                .or(previous_refresh),
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in),
        }
    }
}
