use error_stack::{Report, ResultExt};
use indicatif::ProgressBar;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::config::GeneratorConfig;
use crate::diagnostics::DiagnosticsSink;
use crate::playlist::matcher::TrackMatcher;
use crate::playlist::populator::{BatchPopulator, PopulateError};
use crate::playlist::{
    bounded, GenerationError, GenerationResult, GenerationStage, GeneratorResult, Interrupted,
    MatchResult, PlaylistSpec, UnresolvedTrack,
};
use crate::spotify::PlaylistDestination;
use crate::track::TrackList;
use crate::youtube::TrackSource;

/// Resolved URIs in source order, plus every track that could not be matched.
#[derive(Debug, Default)]
struct MatchOutcome {
    uris: Vec<String>,
    unresolved: Vec<UnresolvedTrack>,
}

/// Runs one YouTube → Spotify conversion:
/// fetch source, resolve user, create playlist, match tracks, populate, summarize.
///
/// The collaborators are borrowed for the duration of the run. The Spotify side is
/// an already-authorized client, so this type never touches credentials.
pub struct PlaylistGenerator<'a> {
    source: &'a dyn TrackSource,
    destination: &'a dyn PlaylistDestination,
    diagnostics: &'a dyn DiagnosticsSink,
    config: GeneratorConfig,
    progress: ProgressBar,
}

impl<'a> PlaylistGenerator<'a> {
    pub fn new(
        source: &'a dyn TrackSource,
        destination: &'a dyn PlaylistDestination,
        diagnostics: &'a dyn DiagnosticsSink,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            source,
            destination,
            diagnostics,
            config,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub async fn generate(
        &self,
        spec: &PlaylistSpec,
        playlist_url: &str,
        cancel: &CancellationToken,
    ) -> GeneratorResult<GenerationResult> {
        spec.validate()?;

        let tracks = self.fetch_source(playlist_url, cancel).await?;
        info!("Found {} distinct tracks in the source playlist", tracks.len());

        let user_id = self.resolve_identity(cancel).await?;
        let playlist_id = self.create_playlist(&user_id, spec, cancel).await?;
        info!("Created playlist \"{}\" ({playlist_id})", spec.name);

        let outcome = self.match_all(&tracks, cancel).await?;
        let added_count = self
            .populate(&playlist_id, &outcome.uris, &outcome.unresolved, cancel)
            .await?;

        let result = self.summarize(added_count, outcome.unresolved);
        debug_assert_eq!(result.added_count + result.error_count, tracks.len());
        Ok(result)
    }

    async fn fetch_source(
        &self,
        playlist_url: &str,
        cancel: &CancellationToken,
    ) -> GeneratorResult<TrackList> {
        let fetch = self.source.fetch_playlist_tracks(playlist_url);
        let tracks = self
            .guard(GenerationStage::FetchSource, self.config.source_timeout, fetch, cancel)
            .await?
            .change_context(GenerationError::SourceUnavailable)?;
        if tracks.is_empty() {
            return Err(Report::new(GenerationError::SourceUnavailable)
                .attach_printable("the source playlist has no tracks".to_string()));
        }
        Ok(tracks)
    }

    async fn resolve_identity(&self, cancel: &CancellationToken) -> GeneratorResult<String> {
        let lookup = self.destination.current_user_id();
        self.guard(
            GenerationStage::ResolveDestinationIdentity,
            self.config.call_timeout,
            lookup,
            cancel,
        )
            .await?
            .change_context(GenerationError::IdentityUnavailable)
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        spec: &PlaylistSpec,
        cancel: &CancellationToken,
    ) -> GeneratorResult<String> {
        let create = self.destination.create_playlist(user_id, spec);
        self.guard(
            GenerationStage::CreateDestinationPlaylist,
            self.config.call_timeout,
            create,
            cancel,
        )
            .await?
            .change_context(GenerationError::PlaylistCreateFailed)
    }

    async fn match_all(
        &self,
        tracks: &TrackList,
        cancel: &CancellationToken,
    ) -> GeneratorResult<MatchOutcome> {
        let matcher = TrackMatcher::new(self.destination, self.config.call_timeout);
        let mut outcome = MatchOutcome::default();
        self.progress.set_length(tracks.len() as u64);
        for track in tracks {
            self.progress.set_message(track.to_string());
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    self.progress.abandon();
                    return Err(Report::new(GenerationError::Cancelled {
                        stage: GenerationStage::MatchAllTracks,
                    }));
                }
                result = matcher.match_track(track) => result,
            };
            match result {
                MatchResult::Resolved(uri) => outcome.uris.push(uri),
                MatchResult::Unresolved(reason) => outcome.unresolved.push(UnresolvedTrack {
                    track: track.clone(),
                    reason,
                }),
            }
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();
        info!(
            "Matched {} of {} tracks",
            outcome.uris.len(),
            tracks.len()
        );
        Ok(outcome)
    }

    async fn populate(
        &self,
        playlist_id: &str,
        uris: &[String],
        unresolved: &[UnresolvedTrack],
        cancel: &CancellationToken,
    ) -> GeneratorResult<usize> {
        let populator = BatchPopulator::new(
            self.destination,
            self.config.batch_ceiling,
            self.config.call_timeout,
            cancel,
        );
        let report = match populator.populate(playlist_id, uris).await {
            Ok(added) => return Ok(added),
            Err(report) => report,
        };
        let error = match report.current_context().clone() {
            PopulateError::EmptyInput => GenerationError::EmptyResolution,
            PopulateError::AppendFailed { added } => GenerationError::PopulateFailed { added },
            PopulateError::Cancelled { .. } => {
                return Err(report.change_context(GenerationError::Cancelled {
                    stage: GenerationStage::PopulateDestination,
                }));
            }
        };
        let mut report = report.change_context(error);
        // the run failed but the misses are still worth showing
        if let Some(location) = self.diagnostics.record(unresolved) {
            report = report.attach_printable(format!("Unresolved tracks written to {location}"));
        }
        Err(report)
    }

    fn summarize(&self, added_count: usize, unresolved: Vec<UnresolvedTrack>) -> GenerationResult {
        let diagnostics_path = self.diagnostics.record(&unresolved);
        if !unresolved.is_empty() {
            warn!("{} tracks could not be found on Spotify", unresolved.len());
        }
        GenerationResult {
            added_count,
            error_count: unresolved.len(),
            diagnostics_path,
        }
    }

    /// Bounds a collaborator call by `limit` and the run's cancellation.
    async fn guard<F: std::future::Future>(
        &self,
        stage: GenerationStage,
        limit: std::time::Duration,
        call: F,
        cancel: &CancellationToken,
    ) -> GeneratorResult<F::Output> {
        bounded(cancel, limit, call)
            .await
            .map_err(|interrupted| match interrupted {
                Interrupted::Cancelled => Report::new(GenerationError::Cancelled { stage }),
                Interrupted::TimedOut(_) => Report::new(stage_error(stage))
                    .attach_printable(format!("{stage}: {interrupted}")),
            })
    }
}

fn stage_error(stage: GenerationStage) -> GenerationError {
    match stage {
        GenerationStage::ValidatePlaylist => GenerationError::InvalidPlaylist,
        GenerationStage::FetchSource => GenerationError::SourceUnavailable,
        GenerationStage::ResolveDestinationIdentity => GenerationError::IdentityUnavailable,
        GenerationStage::CreateDestinationPlaylist => GenerationError::PlaylistCreateFailed,
        GenerationStage::MatchAllTracks => GenerationError::EmptyResolution,
        GenerationStage::PopulateDestination => GenerationError::PopulateFailed { added: 0 },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::playlist::Visibility;
    use crate::spotify::{SpotifyError, SpotifyResult};
    use crate::track::Track;
    use crate::youtube::{YoutubeError, YoutubeResult};

    struct FakeSource {
        tracks: Option<Vec<Track>>,
    }

    #[async_trait]
    impl TrackSource for FakeSource {
        async fn fetch_playlist_tracks(&self, _: &str) -> YoutubeResult<TrackList> {
            match &self.tracks {
                Some(tracks) => Ok(tracks.iter().cloned().collect()),
                None => Err(Report::new(YoutubeError)
                    .attach_printable("failed to fetch playlist items".to_string())),
            }
        }
    }

    /// Delivers its tracks one page at a time, waiting `page_delay` per page.
    struct PagedSource {
        pages: Vec<Vec<Track>>,
        page_delay: Duration,
    }

    #[async_trait]
    impl TrackSource for PagedSource {
        async fn fetch_playlist_tracks(&self, _: &str) -> YoutubeResult<TrackList> {
            let mut tracks = TrackList::new();
            for page in &self.pages {
                tokio::time::sleep(self.page_delay).await;
                for track in page {
                    tracks.push(track.clone());
                }
            }
            Ok(tracks)
        }
    }

    #[derive(Default)]
    struct FakeSpotify {
        catalog: HashMap<(String, String), String>,
        fail_identity: bool,
        fail_create: bool,
        stall_create: bool,
        fail_append_call: Option<usize>,
        cancel_on_search: Option<CancellationToken>,
        created: Mutex<Vec<(String, PlaylistSpec)>>,
        searches: Mutex<Vec<Track>>,
        appended: Mutex<Vec<Vec<String>>>,
    }

    impl FakeSpotify {
        fn with_catalog(entries: &[(&str, &str, &str)]) -> Self {
            Self {
                catalog: entries
                    .iter()
                    .map(|(artist, title, uri)| {
                        ((artist.to_string(), title.to_string()), uri.to_string())
                    })
                    .collect(),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl PlaylistDestination for FakeSpotify {
        async fn current_user_id(&self) -> SpotifyResult<String> {
            if self.fail_identity {
                return Err(Report::new(SpotifyError)
                    .attach_printable("failed to get current user: 401".to_string()));
            }
            Ok("user-1".to_string())
        }

        async fn create_playlist(&self, user_id: &str, spec: &PlaylistSpec) -> SpotifyResult<String> {
            if self.fail_create {
                return Err(Report::new(SpotifyError)
                    .attach_printable("failed to create playlist: 403".to_string()));
            }
            if self.stall_create {
                std::future::pending::<()>().await;
            }
            self.created
                .lock()
                .unwrap()
                .push((user_id.to_string(), spec.clone()));
            Ok("playlist-1".to_string())
        }

        async fn search_track(&self, artist: &str, title: &str) -> SpotifyResult<Option<String>> {
            self.searches.lock().unwrap().push(Track::new(artist, title));
            if let Some(cancel) = &self.cancel_on_search {
                cancel.cancel();
            }
            Ok(self
                .catalog
                .get(&(artist.to_string(), title.to_string()))
                .cloned())
        }

        async fn append_tracks(&self, _: &str, uris: &[String]) -> SpotifyResult<usize> {
            let mut appended = self.appended.lock().unwrap();
            appended.push(uris.to_vec());
            if Some(appended.len()) == self.fail_append_call {
                return Err(Report::new(SpotifyError)
                    .attach_printable("failed adding track to playlist: 500".to_string()));
            }
            Ok(uris.len())
        }
    }

    #[derive(Default)]
    struct FakeDiagnostics {
        recorded: Mutex<Vec<Vec<UnresolvedTrack>>>,
    }

    impl DiagnosticsSink for FakeDiagnostics {
        fn record(&self, failures: &[UnresolvedTrack]) -> Option<String> {
            if failures.is_empty() {
                return None;
            }
            self.recorded.lock().unwrap().push(failures.to_vec());
            Some("logs/log-test.txt".to_string())
        }
    }

    fn spec() -> PlaylistSpec {
        PlaylistSpec::new("Mix", "From YouTube", Visibility::Private).unwrap()
    }

    fn config(batch_ceiling: usize) -> GeneratorConfig {
        GeneratorConfig {
            batch_ceiling,
            call_timeout: Duration::from_secs(1),
            source_timeout: Duration::from_secs(5),
        }
    }

    fn source(pairs: &[(&str, &str)]) -> FakeSource {
        FakeSource {
            tracks: Some(
                pairs
                    .iter()
                    .map(|(artist, title)| Track::new(*artist, *title))
                    .collect(),
            ),
        }
    }

    #[tokio::test]
    async fn test_end_to_end_with_duplicate_and_miss() {
        let source = source(&[("A", "X"), ("A", "X"), ("B", "Y")]);
        let spotify = FakeSpotify::with_catalog(&[("A", "X", "spotify:track:ax")]);
        let diagnostics = FakeDiagnostics::default();
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config(100));

        let result = generator
            .generate(&spec(), "https://youtube.com/playlist?list=x", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            result,
            GenerationResult {
                added_count: 1,
                error_count: 1,
                diagnostics_path: Some("logs/log-test.txt".to_string()),
            }
        );
        let recorded = diagnostics.recorded.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].len(), 1);
        assert_eq!(recorded[0][0].track, Track::new("B", "Y"));
        assert_eq!(recorded[0][0].reason, "track not found");
        assert_eq!(
            *spotify.appended.lock().unwrap(),
            vec![vec!["spotify:track:ax".to_string()]]
        );
        let created = spotify.created.lock().unwrap();
        assert_eq!(created[0].0, "user-1");
        assert_eq!(created[0].1.name, "Mix");
    }

    #[tokio::test]
    async fn test_all_resolved_has_no_diagnostics() {
        let source = source(&[("A", "X"), ("B", "Y")]);
        let spotify = FakeSpotify::with_catalog(&[
            ("A", "X", "spotify:track:ax"),
            ("B", "Y", "spotify:track:by"),
        ]);
        let diagnostics = FakeDiagnostics::default();
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config(100));

        let result = generator
            .generate(&spec(), "url", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.added_count, 2);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.diagnostics_path, None);
        assert!(diagnostics.recorded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counts_always_cover_every_track() {
        let titles = (0..23)
            .map(|i| (format!("Artist {i}"), format!("Song {i}")))
            .collect::<Vec<_>>();
        let pairs = titles
            .iter()
            .map(|(artist, title)| (artist.as_str(), title.as_str()))
            .collect::<Vec<_>>();
        let source = source(&pairs);
        let mut spotify = FakeSpotify::default();
        for (index, (artist, title)) in titles.iter().enumerate() {
            if index % 3 != 0 {
                spotify.catalog.insert(
                    (artist.clone(), title.clone()),
                    format!("spotify:track:{index}"),
                );
            }
        }
        let diagnostics = FakeDiagnostics::default();
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config(5));

        let result = generator
            .generate(&spec(), "url", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.added_count + result.error_count, 23);
        assert_eq!(result.error_count, 8);
        let sizes = spotify
            .appended
            .lock()
            .unwrap()
            .iter()
            .map(Vec::len)
            .collect::<Vec<_>>();
        assert_eq!(sizes, vec![5, 5, 5]);

        let expected_uris = (0..23)
            .filter(|index| index % 3 != 0)
            .map(|index| format!("spotify:track:{index}"))
            .collect::<Vec<_>>();
        assert_eq!(spotify.appended.lock().unwrap().concat(), expected_uris);

        let recorded = diagnostics.recorded.lock().unwrap();
        let missed = recorded[0]
            .iter()
            .map(|failure| failure.track.clone())
            .collect::<Vec<_>>();
        let expected_missed = (0..23)
            .filter(|index| index % 3 == 0)
            .map(|index| Track::new(format!("Artist {index}"), format!("Song {index}")))
            .collect::<Vec<_>>();
        assert_eq!(missed, expected_missed);
        assert!(recorded[0]
            .iter()
            .all(|failure| failure.reason == "track not found"));
    }

    #[tokio::test]
    async fn test_slow_multi_page_source_is_not_cut_by_call_timeout() {
        let pages = (0..4)
            .map(|page| vec![Track::new(format!("Artist {page}"), format!("Song {page}"))])
            .collect::<Vec<_>>();
        let source = PagedSource {
            pages,
            page_delay: Duration::from_millis(40),
        };
        let spotify = FakeSpotify::with_catalog(&[("Artist 0", "Song 0", "spotify:track:0")]);
        let diagnostics = FakeDiagnostics::default();
        let config = GeneratorConfig {
            batch_ceiling: 100,
            call_timeout: Duration::from_millis(100),
            source_timeout: Duration::from_secs(5),
        };
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config);

        let result = generator
            .generate(&spec(), "url", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.added_count + result.error_count, 4);
        assert_eq!(spotify.searches.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_source_over_its_budget_is_unavailable() {
        let source = PagedSource {
            pages: vec![vec![Track::new("A", "X")]; 3],
            page_delay: Duration::from_millis(50),
        };
        let spotify = FakeSpotify::default();
        let diagnostics = FakeDiagnostics::default();
        let config = GeneratorConfig {
            batch_ceiling: 100,
            call_timeout: Duration::from_secs(1),
            source_timeout: Duration::from_millis(60),
        };
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config);

        let report = generator
            .generate(&spec(), "url", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(report.current_context(), &GenerationError::SourceUnavailable);
        assert!(spotify.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stalled_create_times_out_before_matching() {
        let source = source(&[("A", "X")]);
        let spotify = FakeSpotify {
            stall_create: true,
            ..FakeSpotify::with_catalog(&[("A", "X", "spotify:track:ax")])
        };
        let diagnostics = FakeDiagnostics::default();
        let config = GeneratorConfig {
            batch_ceiling: 100,
            call_timeout: Duration::from_millis(50),
            source_timeout: Duration::from_secs(5),
        };
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config);

        let report = generator
            .generate(&spec(), "url", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(report.current_context(), &GenerationError::PlaylistCreateFailed);
        assert_eq!(
            report.current_context().stage(),
            GenerationStage::CreateDestinationPlaylist
        );
        assert!(spotify.searches.lock().unwrap().is_empty());
        assert!(diagnostics.recorded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_source_failure_is_fatal() {
        let source = FakeSource { tracks: None };
        let spotify = FakeSpotify::default();
        let diagnostics = FakeDiagnostics::default();
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config(100));

        let report = generator
            .generate(&spec(), "url", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(report.current_context(), &GenerationError::SourceUnavailable);
        assert_eq!(report.current_context().stage(), GenerationStage::FetchSource);
        assert!(spotify.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_source_is_fatal() {
        let source = source(&[]);
        let spotify = FakeSpotify::default();
        let diagnostics = FakeDiagnostics::default();
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config(100));

        let report = generator
            .generate(&spec(), "url", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(report.current_context(), &GenerationError::SourceUnavailable);
    }

    #[tokio::test]
    async fn test_identity_failure_stops_before_create() {
        let source = source(&[("A", "X")]);
        let spotify = FakeSpotify {
            fail_identity: true,
            ..Default::default()
        };
        let diagnostics = FakeDiagnostics::default();
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config(100));

        let report = generator
            .generate(&spec(), "url", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(report.current_context(), &GenerationError::IdentityUnavailable);
        assert!(spotify.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_stops_before_matching() {
        let source = source(&[("A", "X")]);
        let spotify = FakeSpotify {
            fail_create: true,
            ..Default::default()
        };
        let diagnostics = FakeDiagnostics::default();
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config(100));

        let report = generator
            .generate(&spec(), "url", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(report.current_context(), &GenerationError::PlaylistCreateFailed);
        assert!(spotify.searches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_spec_never_reaches_collaborators() {
        let source = source(&[("A", "X")]);
        let spotify = FakeSpotify::default();
        let diagnostics = FakeDiagnostics::default();
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config(100));
        let bad_spec = PlaylistSpec {
            name: "what?".to_string(),
            description: String::new(),
            visibility: Visibility::Public,
        };

        let report = generator
            .generate(&bad_spec, "url", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(report.current_context(), &GenerationError::InvalidPlaylist);
        assert!(spotify.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_resolved_is_empty_resolution() {
        let source = source(&[("A", "X"), ("B", "Y")]);
        let spotify = FakeSpotify::default();
        let diagnostics = FakeDiagnostics::default();
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config(100));

        let report = generator
            .generate(&spec(), "url", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(report.current_context(), &GenerationError::EmptyResolution);
        assert!(spotify.appended.lock().unwrap().is_empty());
        let recorded = diagnostics.recorded.lock().unwrap();
        assert_eq!(recorded[0].len(), 2);
    }

    #[tokio::test]
    async fn test_populate_failure_keeps_partial_progress() {
        let titles = (0..7)
            .map(|i| (format!("Artist {i}"), format!("Song {i}")))
            .collect::<Vec<_>>();
        let pairs = titles
            .iter()
            .map(|(artist, title)| (artist.as_str(), title.as_str()))
            .collect::<Vec<_>>();
        let source = source(&pairs);
        let mut spotify = FakeSpotify {
            fail_append_call: Some(2),
            ..Default::default()
        };
        for (index, (artist, title)) in titles.iter().enumerate() {
            spotify.catalog.insert(
                (artist.clone(), title.clone()),
                format!("spotify:track:{index}"),
            );
        }
        let diagnostics = FakeDiagnostics::default();
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config(3));

        let report = generator
            .generate(&spec(), "url", &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            report.current_context(),
            &GenerationError::PopulateFailed { added: 3 }
        );
        assert_eq!(
            report.current_context().stage(),
            GenerationStage::PopulateDestination
        );
    }

    #[tokio::test]
    async fn test_cancellation_stops_new_lookups() {
        let cancel = CancellationToken::new();
        let source = source(&[("A", "X"), ("B", "Y"), ("C", "Z")]);
        let spotify = FakeSpotify {
            cancel_on_search: Some(cancel.clone()),
            ..FakeSpotify::with_catalog(&[("A", "X", "spotify:track:ax")])
        };
        let diagnostics = FakeDiagnostics::default();
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config(100));

        let report = generator.generate(&spec(), "url", &cancel).await.unwrap_err();

        assert_eq!(
            report.current_context(),
            &GenerationError::Cancelled {
                stage: GenerationStage::MatchAllTracks
            }
        );
        assert_eq!(spotify.searches.lock().unwrap().len(), 1);
        assert!(spotify.appended.lock().unwrap().is_empty());
        assert!(diagnostics.recorded.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let source = source(&[("A", "X")]);
        let spotify = FakeSpotify::default();
        let diagnostics = FakeDiagnostics::default();
        let generator = PlaylistGenerator::new(&source, &spotify, &diagnostics, config(100));

        let report = generator.generate(&spec(), "url", &cancel).await.unwrap_err();

        assert_eq!(
            report.current_context(),
            &GenerationError::Cancelled {
                stage: GenerationStage::FetchSource
            }
        );
    }
}
