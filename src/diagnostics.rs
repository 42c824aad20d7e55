use std::fmt;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use error_stack::{IntoReport, ResultExt};
use log::{info, warn};

use crate::config::AppConfig;
use crate::playlist::UnresolvedTrack;

#[derive(Debug)]
pub struct DiagnosticsError;

impl fmt::Display for DiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Diagnostics error")
    }
}

impl std::error::Error for DiagnosticsError {}

pub type DiagnosticsResult<T> = error_stack::Result<T, DiagnosticsError>;

/// Receives the tracks that could not be matched at the end of a run.
pub trait DiagnosticsSink: Send + Sync {
    /// Returns where the failures were written, or `None` when there was nothing to write.
    fn record(&self, failures: &[UnresolvedTrack]) -> Option<String>;
}

/// Writes unresolved tracks to a timestamped text file.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    dir: PathBuf,
}

impl ErrorLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn write(&self, failures: &[UnresolvedTrack]) -> DiagnosticsResult<PathBuf> {
        fs::create_dir_all(&self.dir)
            .into_report()
            .change_context(DiagnosticsError)
            .attach_printable_lazy(|| format!("Could not create {}", self.dir.display()))?;
        let file_name = Local::now()
            .format("log-%Y-%m-%d-%H-%M-%S.txt")
            .to_string();
        let full_path = self.dir.join(file_name);
        let mut file = fs::File::create(&full_path)
            .into_report()
            .change_context(DiagnosticsError)
            .attach_printable_lazy(|| format!("Could not create {}", full_path.display()))?;
        for failure in failures {
            writeln!(file, "{}", Self::format_line(failure))
                .into_report()
                .change_context(DiagnosticsError)?;
        }
        Ok(full_path)
    }

    fn format_line(failure: &UnresolvedTrack) -> String {
        format!(
            "{} - {}: {}",
            failure.track.artist, failure.track.title, failure.reason
        )
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new(AppConfig::DIAGNOSTICS_DIR)
    }
}

impl DiagnosticsSink for ErrorLog {
    fn record(&self, failures: &[UnresolvedTrack]) -> Option<String> {
        if failures.is_empty() {
            return None;
        }
        match self.write(failures) {
            Ok(path) => {
                info!(
                    "Wrote {} unresolved tracks to {}",
                    failures.len(),
                    path.display()
                );
                Some(path.display().to_string())
            }
            Err(report) => {
                warn!("Could not write the unresolved tracks log: {report:?}");
                None
            }
        }
    }
}
