use std::fmt;

use clap::{Parser, Subcommand};
use colored::Colorize;
use error_stack::fmt::{Charset, ColorMode};
use error_stack::{Report, ResultExt};
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::auth::spotify_auth::SpotifyAuth;
use crate::config::{AppConfig, Credentials};
use crate::playlist::commands::{GenerateArgs, PlaylistCommands};

mod auth;
mod config;
mod diagnostics;
mod dialoguer;
mod playlist;
mod spotify;
mod track;
mod validation;
mod youtube;

#[derive(Debug)]
pub struct Y2SpotError;
impl fmt::Display for Y2SpotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("y2spot error")
    }
}
impl std::error::Error for Y2SpotError {}

pub type Y2SpotResult<T> = error_stack::Result<T, Y2SpotError>;

/// Per-track progress is logged at `info`, below this, so it stays off the progress bar.
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Create Spotify playlists from YouTube playlists")]
struct Cli {
    #[command(subcommand)]
    command: Y2SpotCommands,
}

#[derive(Subcommand, Debug, PartialEq, Clone)]
enum Y2SpotCommands {
    /// Log in to Spotify and store the token
    Login,
    /// Create a Spotify playlist from a YouTube playlist or mix
    Generate(GenerateArgs),
    /// Show the current configuration
    Config,
    /// Remove the stored Spotify token
    Logout,
}

impl Y2SpotCommands {
    pub async fn execute(&self, cancel: &CancellationToken) -> Y2SpotResult<()> {
        match self {
            Y2SpotCommands::Login => {
                let credentials = Credentials::load().change_context(Y2SpotError)?;
                let auth = SpotifyAuth::new(&credentials).change_context(Y2SpotError)?;
                auth.login(cancel).await.change_context(Y2SpotError)?;
                println!("{}", "✅ Successfully logged in to Spotify".green());
                Ok(())
            }
            Y2SpotCommands::Generate(args) => {
                PlaylistCommands::generate(args.clone(), cancel)
                    .await
                    .change_context(Y2SpotError)?;
                Ok(())
            }
            Y2SpotCommands::Config => {
                let credentials = Credentials::load().change_context(Y2SpotError)?;
                let auth = SpotifyAuth::new(&credentials).change_context(Y2SpotError)?;
                println!("Current config:\n{:#?}", credentials);
                println!("Token file: {}", auth.store().path().display());
                println!("Diagnostics dir: {}", AppConfig::DIAGNOSTICS_DIR);
                let status = if auth.is_authenticated() {
                    "logged in".green()
                } else {
                    "not logged in".red()
                };
                println!("Spotify: {status}");
                Ok(())
            }
            Y2SpotCommands::Logout => {
                let credentials = Credentials::load().change_context(Y2SpotError)?;
                let auth = SpotifyAuth::new(&credentials).change_context(Y2SpotError)?;
                if auth.logout().change_context(Y2SpotError)? {
                    println!("{}", "Logged out from Spotify".green());
                } else {
                    println!("{}", "There was no stored Spotify session".yellow());
                }
                Ok(())
            }
        }
    }

    pub fn cli_command(&self) -> String {
        match self {
            Y2SpotCommands::Login => "y2spot login".to_string(),
            Y2SpotCommands::Generate(..) => "y2spot generate".to_string(),
            Y2SpotCommands::Config => "y2spot config".to_string(),
            Y2SpotCommands::Logout => "y2spot logout".to_string(),
        }
    }
}

pub struct Suggestion(String);

impl Suggestion {
    pub fn set_report() {
        Report::set_charset(Charset::Utf8);
        Report::set_color_mode(ColorMode::Color);
        Report::install_debug_hook::<Self>(|Self(value), context| {
            context.push_body(format!("{}: {value}", "suggestion".yellow()))
        });
    }
}

/// Cancels the token on the first Ctrl-C or SIGTERM.
fn cancel_on_signal(cancel: CancellationToken) {
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Shutdown signal received, cancelling");
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let Ok(mut terminate) = signal(SignalKind::terminate()) else {
        let _ = tokio::signal::ctrl_c().await;
        return;
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

async fn run() -> Y2SpotResult<()> {
    let cli = Cli::parse();

    Suggestion::set_report();

    let cancel = CancellationToken::new();
    cancel_on_signal(cancel.clone());

    info!("Running {}", cli.command.cli_command());
    let Err(report) = cli.command.execute(&cancel).await else {
        return Ok(());
    };
    Err(failure_report(report, &cli.command, cancel.is_cancelled()))
}

/// A failure seen after a shutdown signal is reported as a cancellation.
fn failure_report(
    report: Report<Y2SpotError>,
    command: &Y2SpotCommands,
    cancelled: bool,
) -> Report<Y2SpotError> {
    if cancelled {
        return report.attach_printable(format!("{} was cancelled", command.cli_command()));
    }
    report.attach(Suggestion(format!(
        "Run `{} --help` to check the available options",
        command.cli_command()
    )))
}

#[tokio::main]
async fn main() -> Y2SpotResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .init();
    run().await
}
