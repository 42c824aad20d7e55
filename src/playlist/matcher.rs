use std::time::Duration;

use error_stack::{Context, Report};
use log::info;

use crate::playlist::MatchResult;
use crate::spotify::PlaylistDestination;
use crate::track::Track;

pub const NOT_FOUND_REASON: &str = "track not found";

/// Looks tracks up in the destination catalog, one query per track.
///
/// The top-ranked result is accepted as-is: there is no local scoring, so a
/// same-named track by a different artist can be picked.
pub struct TrackMatcher<'a> {
    destination: &'a dyn PlaylistDestination,
    call_timeout: Duration,
}

impl<'a> TrackMatcher<'a> {
    pub fn new(destination: &'a dyn PlaylistDestination, call_timeout: Duration) -> Self {
        Self {
            destination,
            call_timeout,
        }
    }

    pub async fn match_track(&self, track: &Track) -> MatchResult {
        info!("Searching URI for \"{track}\"...");
        let search = self.destination.search_track(&track.artist, &track.title);
        let result = match tokio::time::timeout(self.call_timeout, search).await {
            Ok(Ok(Some(uri))) => MatchResult::Resolved(uri),
            Ok(Ok(None)) => MatchResult::Unresolved(NOT_FOUND_REASON.to_string()),
            Ok(Err(report)) => MatchResult::Unresolved(report_reason(&report)),
            Err(_) => MatchResult::Unresolved(format!(
                "search timed out after {}s",
                self.call_timeout.as_secs()
            )),
        };
        match &result {
            MatchResult::Resolved(uri) => info!("Found {uri} for \"{track}\""),
            MatchResult::Unresolved(reason) => info!("No match for \"{track}\": {reason}"),
        }
        result
    }
}

/// Most recent printable message attached to the report, or its context.
pub fn report_reason<C: Context>(report: &Report<C>) -> String {
    report
        .frames()
        .find_map(|frame| {
            frame
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| frame.downcast_ref::<&'static str>().map(|s| s.to_string()))
        })
        .unwrap_or_else(|| report.current_context().to_string())
}
