use std::fmt;
use std::future::Future;
use std::time::Duration;

use error_stack::Report;
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::track::Track;
use crate::validation::is_playlist_name_allowed;

pub mod commands;
pub mod generator;
pub mod matcher;
pub mod populator;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
    EnumIter,
)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSpec {
    pub name: String,
    pub description: String,
    pub visibility: Visibility,
}

impl PlaylistSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        visibility: Visibility,
    ) -> GeneratorResult<Self> {
        let spec = Self {
            name: name.into().trim().to_string(),
            description: description.into().trim().to_string(),
            visibility,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> GeneratorResult<()> {
        if !is_playlist_name_allowed(&self.name) {
            return Err(Report::new(GenerationError::InvalidPlaylist).attach_printable(format!(
                "playlist name must be 1-100 characters without < > : \" / \\ | ? *, got \"{}\"",
                self.name
            )));
        }
        Ok(())
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// Outcome of looking one track up in the destination catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    Resolved(String),
    Unresolved(String),
}

/// A track the destination could not provide, with the reason why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedTrack {
    pub track: Track,
    pub reason: String,
}

/// Summary of a completed run. `added_count + error_count` equals the number of
/// distinct source tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub added_count: usize,
    pub error_count: usize,
    pub diagnostics_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum GenerationStage {
    #[strum(serialize = "validate playlist")]
    ValidatePlaylist,
    #[strum(serialize = "fetch source")]
    FetchSource,
    #[strum(serialize = "resolve destination identity")]
    ResolveDestinationIdentity,
    #[strum(serialize = "create destination playlist")]
    CreateDestinationPlaylist,
    #[strum(serialize = "match all tracks")]
    MatchAllTracks,
    #[strum(serialize = "populate destination")]
    PopulateDestination,
}

/// Fatal outcomes of a run. Per-track misses never show up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("invalid playlist settings")]
    InvalidPlaylist,
    #[error("could not read the YouTube playlist")]
    SourceUnavailable,
    #[error("could not resolve the Spotify user")]
    IdentityUnavailable,
    #[error("could not create the Spotify playlist")]
    PlaylistCreateFailed,
    #[error("none of the tracks could be found on Spotify")]
    EmptyResolution,
    #[error("failed to add tracks to the playlist, {added} tracks were added before the failure")]
    PopulateFailed { added: usize },
    #[error("cancelled during {stage}")]
    Cancelled { stage: GenerationStage },
}

impl GenerationError {
    pub fn stage(&self) -> GenerationStage {
        match self {
            GenerationError::InvalidPlaylist => GenerationStage::ValidatePlaylist,
            GenerationError::SourceUnavailable => GenerationStage::FetchSource,
            GenerationError::IdentityUnavailable => GenerationStage::ResolveDestinationIdentity,
            GenerationError::PlaylistCreateFailed => GenerationStage::CreateDestinationPlaylist,
            GenerationError::EmptyResolution | GenerationError::PopulateFailed { .. } => {
                GenerationStage::PopulateDestination
            }
            GenerationError::Cancelled { stage } => *stage,
        }
    }
}

pub type GeneratorResult<T> = error_stack::Result<T, GenerationError>;

/// Why an external call did not produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    Cancelled,
    TimedOut(Duration),
}

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interrupted::Cancelled => f.write_str("cancelled"),
            Interrupted::TimedOut(limit) => write!(f, "timed out after {}s", limit.as_secs()),
        }
    }
}

/// Runs `call` until it finishes, `limit` elapses or `cancel` fires.
pub async fn bounded<F: Future>(
    cancel: &CancellationToken,
    limit: Duration,
    call: F,
) -> Result<F::Output, Interrupted> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Interrupted::Cancelled),
        output = tokio::time::timeout(limit, call) => output.map_err(|_| Interrupted::TimedOut(limit)),
    }
}
