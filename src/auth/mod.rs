use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub mod callback;
pub mod spotify_auth;

#[derive(Debug)]
pub struct AuthError;

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Authentication error")
    }
}

impl std::error::Error for AuthError {}

pub type AuthResult<T> = error_stack::Result<T, AuthError>;

/// Spotify credentials persisted between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl StoredToken {
    /// Tokens this close to expiry are refreshed before use.
    pub const EXPIRY_MARGIN_SECS: i64 = 60;

    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(Self::EXPIRY_MARGIN_SECS) <= now
    }
}
