use std::fmt;

use clap::Args;
use colored::Colorize;
use error_stack::{IntoReport, Report, ResultExt};
use indicatif::{ProgressBar, ProgressStyle};
use inflector::Inflector;
use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;

use crate::auth::spotify_auth::SpotifyAuth;
use crate::config::{Credentials, GeneratorConfig};
use crate::dialoguer::Dialoguer;
use crate::diagnostics::ErrorLog;
use crate::playlist::generator::PlaylistGenerator;
use crate::playlist::{GenerationError, GenerationResult, PlaylistSpec, Visibility};
use crate::validation::{is_playlist_name_allowed, is_youtube_playlist_url};
use crate::youtube::client::YoutubeClient;

#[derive(Debug)]
pub struct PlaylistCommandError;

impl fmt::Display for PlaylistCommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Playlist command error")
    }
}

impl std::error::Error for PlaylistCommandError {}

pub type PlaylistCommandResult<T> = error_stack::Result<T, PlaylistCommandError>;

#[derive(Args, Debug, Clone, PartialEq, Default)]
pub struct GenerateArgs {
    /// YouTube playlist or mix url
    #[clap(long, short)]
    pub url: Option<String>,
    /// Name of the new Spotify playlist
    #[clap(long, short)]
    pub name: Option<String>,
    /// Description of the new Spotify playlist
    #[clap(long, short)]
    pub description: Option<String>,
    #[clap(long, short, value_enum)]
    pub visibility: Option<Visibility>,
    /// Skip the confirmation prompt
    #[clap(long, short, action)]
    pub yes: bool,
}

/// Settings for one run, after flags and prompts have been merged.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub playlist_url: String,
    pub spec: PlaylistSpec,
}

impl GenerateRequest {
    /// Builds a request from flags alone. Fails if a flag is missing or invalid.
    pub fn from_args(args: &GenerateArgs) -> PlaylistCommandResult<Self> {
        let playlist_url = args
            .url
            .clone()
            .ok_or(PlaylistCommandError)
            .into_report()
            .attach_printable("missing --url")?;
        Self::check_url(&playlist_url)?;
        let name = args
            .name
            .clone()
            .ok_or(PlaylistCommandError)
            .into_report()
            .attach_printable("missing --name")?;
        let spec = PlaylistSpec::new(
            name,
            args.description.clone().unwrap_or_default(),
            args.visibility.unwrap_or(Visibility::Private),
        )
        .change_context(PlaylistCommandError)?;
        Ok(Self {
            playlist_url: playlist_url.trim().to_string(),
            spec,
        })
    }

    fn check_url(playlist_url: &str) -> PlaylistCommandResult<()> {
        if !is_youtube_playlist_url(playlist_url) {
            return Err(Report::new(PlaylistCommandError).attach_printable(format!(
                "{playlist_url} is not a YouTube playlist url"
            )));
        }
        Ok(())
    }

    fn summary(&self) -> String {
        let description = if self.spec.description.is_empty() {
            "-".to_string()
        } else {
            self.spec.description.clone()
        };
        format!(
            "YouTube url: {}\nPlaylist name: {}\nDescription: {}\nVisibility: {}",
            self.playlist_url.cyan(),
            self.spec.name.cyan(),
            description.cyan(),
            self.spec.visibility.to_string().to_sentence_case().cyan(),
        )
    }
}

pub struct PlaylistCommands;

impl PlaylistCommands {
    pub async fn generate(
        args: GenerateArgs,
        cancel: &CancellationToken,
    ) -> PlaylistCommandResult<GenerationResult> {
        let credentials = Credentials::load().change_context(PlaylistCommandError)?;
        let youtube_api_key = credentials
            .youtube_api_key()
            .change_context(PlaylistCommandError)?;

        let request = Self::prompt_missing(args.clone())?;
        println!("{}", request.summary());
        if !args.yes {
            let confirmed = Dialoguer::select_yes_or_no("Create this playlist?".to_string())
                .change_context(PlaylistCommandError)?;
            if !confirmed {
                return Err(Report::new(PlaylistCommandError)
                    .attach_printable("playlist generation aborted by the user".to_string()));
            }
        }

        let auth = SpotifyAuth::new(&credentials).change_context(PlaylistCommandError)?;
        if !auth.is_authenticated() {
            println!("{}", "Not logged in to Spotify yet".yellow());
            auth.login(cancel)
                .await
                .change_context(PlaylistCommandError)?;
        }
        let spotify = auth
            .authorized_client()
            .await
            .change_context(PlaylistCommandError)?;
        let youtube = YoutubeClient::new(youtube_api_key).change_context(PlaylistCommandError)?;
        let error_log = ErrorLog::default();

        println!("{}", "🎵 Generating your playlist...".cyan());
        let generator =
            PlaylistGenerator::new(&youtube, &spotify, &error_log, GeneratorConfig::default())
                .with_progress(Self::progress_bar()?);
        let result = generator
            .generate(&request.spec, &request.playlist_url, cancel)
            .await;

        match result {
            Ok(result) => {
                Self::print_result(&request.spec, &result);
                Ok(result)
            }
            Err(report) => {
                if let GenerationError::Cancelled { stage } = report.current_context() {
                    println!("{}", format!("Cancelled during {stage}").yellow());
                }
                Err(report.change_context(PlaylistCommandError))
            }
        }
    }

    /// Prompts for every value the flags did not provide.
    fn prompt_missing(args: GenerateArgs) -> PlaylistCommandResult<GenerateRequest> {
        let url = match args.url {
            Some(url) => {
                GenerateRequest::check_url(&url)?;
                url
            }
            None => Dialoguer::input_until(
                "YouTube playlist url".to_string(),
                "Please enter a valid YouTube playlist URL",
                is_youtube_playlist_url,
            )
            .change_context(PlaylistCommandError)?,
        };
        let name = match args.name {
            Some(name) => name,
            None => Dialoguer::input_until(
                "Playlist name".to_string(),
                "Name must be 1-100 characters and cannot contain < > : \" / \\ | ? *",
                is_playlist_name_allowed,
            )
            .change_context(PlaylistCommandError)?,
        };
        let description = match args.description {
            Some(description) => description,
            None => Dialoguer::input_allow_empty("Playlist description (optional)".to_string())
                .change_context(PlaylistCommandError)?,
        };
        let visibility = match args.visibility {
            Some(visibility) => visibility,
            None => {
                let selection = Dialoguer::select(
                    "Playlist visibility".to_string(),
                    Self::get_visibility_options(),
                    None,
                )
                .change_context(PlaylistCommandError)?;
                Self::get_visibility_selection(selection)
            }
        };
        GenerateRequest::from_args(&GenerateArgs {
            url: Some(url),
            name: Some(name),
            description: Some(description),
            visibility: Some(visibility),
            yes: args.yes,
        })
    }

    fn get_visibility_options() -> Vec<String> {
        Visibility::iter()
            .map(|element| element.to_string().to_sentence_case())
            .collect::<Vec<_>>()
    }

    fn get_visibility_selection(selection: usize) -> Visibility {
        Visibility::iter()
            .nth(selection)
            .unwrap_or(Visibility::Private)
    }

    fn progress_bar() -> PlaylistCommandResult<ProgressBar> {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.white/blue}] {pos}/{len}")
                .into_report()
                .change_context(PlaylistCommandError)?
                .progress_chars("█  "),
        );
        Ok(pb)
    }

    fn print_result(spec: &PlaylistSpec, result: &GenerationResult) {
        println!(
            "{}",
            format!("✅ Playlist \"{}\" created", spec.name).green()
        );
        println!(
            "{}",
            format!("🎼 {} tracks added", result.added_count).green()
        );
        if result.error_count > 0 {
            println!(
                "{}",
                format!(
                    "❌ {} tracks couldn't be found on Spotify",
                    result.error_count
                )
                .red()
            );
        }
        if let Some(path) = &result.diagnostics_path {
            println!("→ Logs saved in: {}", path.yellow());
        }
    }
}
