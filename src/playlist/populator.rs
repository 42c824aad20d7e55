use std::time::Duration;

use error_stack::Report;
use log::{info, warn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::playlist::{bounded, Interrupted};
use crate::spotify::PlaylistDestination;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PopulateError {
    #[error("no tracks to add: all searches failed")]
    EmptyInput,
    #[error("failed adding tracks to playlist after {added} tracks")]
    AppendFailed { added: usize },
    #[error("cancelled after adding {added} tracks")]
    Cancelled { added: usize },
}

impl PopulateError {
    pub fn added(&self) -> usize {
        match self {
            PopulateError::EmptyInput => 0,
            PopulateError::AppendFailed { added } | PopulateError::Cancelled { added } => *added,
        }
    }
}

pub type PopulateResult<T> = error_stack::Result<T, PopulateError>;

/// Appends URIs to a playlist in consecutive batches no larger than the ceiling.
pub struct BatchPopulator<'a> {
    destination: &'a dyn PlaylistDestination,
    batch_ceiling: usize,
    call_timeout: Duration,
    cancel: &'a CancellationToken,
}

impl<'a> BatchPopulator<'a> {
    pub fn new(
        destination: &'a dyn PlaylistDestination,
        batch_ceiling: usize,
        call_timeout: Duration,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            destination,
            batch_ceiling: batch_ceiling.max(1),
            call_timeout,
            cancel,
        }
    }

    /// Returns how many URIs were appended. On failure the error carries the count
    /// appended by the batches that completed before it.
    pub async fn populate(&self, playlist_id: &str, uris: &[String]) -> PopulateResult<usize> {
        if uris.is_empty() {
            return Err(Report::new(PopulateError::EmptyInput));
        }
        let total_batches = uris.len().div_ceil(self.batch_ceiling);
        let mut added = 0;
        for (batch_index, batch) in uris.chunks(self.batch_ceiling).enumerate() {
            let append = self.destination.append_tracks(playlist_id, batch);
            match bounded(self.cancel, self.call_timeout, append).await {
                Ok(Ok(count)) => {
                    added += count;
                    info!(
                        "Added batch {} of {} ({} tracks)",
                        batch_index + 1,
                        total_batches,
                        count
                    );
                }
                Ok(Err(report)) => {
                    warn!("Batch {} of {} failed", batch_index + 1, total_batches);
                    return Err(report.change_context(PopulateError::AppendFailed { added }));
                }
                Err(Interrupted::Cancelled) => {
                    return Err(Report::new(PopulateError::Cancelled { added }));
                }
                Err(interrupted @ Interrupted::TimedOut(_)) => {
                    return Err(Report::new(PopulateError::AppendFailed { added })
                        .attach_printable(format!("adding batch {}: {interrupted}", batch_index + 1)));
                }
            }
        }
        Ok(added)
    }
}
