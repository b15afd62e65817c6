//! Integration tests for the scan orchestrator.

mod common;

use async_trait::async_trait;
use common::{make_ingestor, seeded_library, slot, test_config};
use showkeeper::core::actions::ActionQueue;
use showkeeper::core::scanner::{DiscoveryOutcome, ScanOrchestrator, ScanStrategy};
use showkeeper::models::action::Action;
use showkeeper::models::episode::FileStatus;
use showkeeper::models::quality::{QualityProfile, Resolution};
use showkeeper::models::show::Show;
use showkeeper::services::provider::{
    EpisodeRecord, MetadataProvider, ShowCandidate, ShowSnapshot,
};
use showkeeper::store::Library;
use showkeeper::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Provider serving one fixed show, with an optional response delay.
struct MockProvider {
    delay: Duration,
}

impl MockProvider {
    fn new() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    fn slow(delay: Duration) -> Self {
        Self { delay }
    }

    fn snapshot() -> ShowSnapshot {
        ShowSnapshot {
            title: "Severance".to_string(),
            status: Some("Returning Series".to_string()),
            first_air_date: chrono::NaiveDate::from_ymd_opt(2022, 2, 18),
            episodes: (1..=3)
                .map(|number| EpisodeRecord {
                    season: 1,
                    number,
                    title: format!("Episode {}", number),
                    air_date: chrono::NaiveDate::from_ymd_opt(2022, 2, number as u32),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl MetadataProvider for MockProvider {
    async fn fetch_show(&self, _provider_id: u64) -> Result<ShowSnapshot> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(Self::snapshot())
    }

    async fn search_shows(&self, query: &str) -> Result<Vec<ShowCandidate>> {
        if query.to_lowercase().contains("severance") {
            Ok(vec![ShowCandidate {
                provider_id: 42,
                title: "Severance".to_string(),
                first_air_date: chrono::NaiveDate::from_ymd_opt(2022, 2, 18),
                overview: None,
            }])
        } else {
            Ok(Vec::new())
        }
    }
}

fn make_scanner(
    library: Arc<Library>,
    config: &showkeeper::models::config::Config,
    provider: MockProvider,
) -> (Arc<ScanOrchestrator>, Arc<ActionQueue>) {
    let (ingestor, queue) = make_ingestor(Arc::clone(&library), config);
    let scanner = Arc::new(ScanOrchestrator::new(
        library,
        ingestor,
        Arc::new(provider),
        config.clone(),
    ));
    (scanner, queue)
}

#[tokio::test]
async fn full_scan_places_loose_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = test_config(dir.path());
    let (library, mut show) = seeded_library(&config).await;
    show.tmdb_id = Some(42);
    library.update_show(show.clone()).await.unwrap();

    // A loose file sitting at the show-folder root.
    let loose = show.folder.join("Severance.S01E02.1080p.x264.mkv");
    std::fs::write(&loose, vec![0u8; 4096]).unwrap();

    let (scanner, _queue) = make_scanner(Arc::clone(&library), &config, MockProvider::new());
    let report = scanner.run(ScanStrategy::Full).await.unwrap();

    assert_eq!(report.shows_scanned, 1);
    assert_eq!(report.episodes_matched, 1);
    assert_eq!(report.errors, 0);
    assert!(!loose.exists());

    let episode = library.get_episode(&slot(&show, 1, 2)).await.unwrap();
    assert_eq!(episode.status, FileStatus::Renamed);

    let status = scanner.status().await;
    assert!(!status.running);
    assert_eq!(status.progress, 100);
    assert!(status.result.is_some());
}

#[tokio::test]
async fn quick_scan_ignores_episodes_outside_recency_window() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = test_config(dir.path());
    let (library, mut show) = seeded_library(&config).await;
    show.tmdb_id = Some(42);
    library.update_show(show.clone()).await.unwrap();

    // Aired in 2022, far outside the 14-day window.
    let loose = show.folder.join("Severance.S01E02.1080p.x264.mkv");
    std::fs::write(&loose, vec![0u8; 4096]).unwrap();

    let (scanner, _queue) = make_scanner(Arc::clone(&library), &config, MockProvider::new());
    let report = scanner.run(ScanStrategy::Quick).await.unwrap();

    assert_eq!(report.episodes_matched, 0);
    assert!(loose.exists());
}

#[tokio::test]
async fn second_scan_is_rejected_while_one_runs() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = test_config(dir.path());
    let (library, mut show) = seeded_library(&config).await;
    show.tmdb_id = Some(42);
    library.update_show(show).await.unwrap();

    let (scanner, _queue) = make_scanner(
        Arc::clone(&library),
        &config,
        MockProvider::slow(Duration::from_millis(300)),
    );

    let first = {
        let scanner = Arc::clone(&scanner);
        tokio::spawn(async move { scanner.run(ScanStrategy::Full).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = scanner.run(ScanStrategy::Full).await;
    assert!(matches!(second, Err(Error::ConcurrentScanRejected)));

    first.await.unwrap().unwrap();
    // The lock is released; a new scan may start.
    scanner.run(ScanStrategy::Full).await.unwrap();
}

#[tokio::test]
async fn cancelled_scan_stops_early_and_keeps_pending_actions() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = test_config(dir.path());
    let (library, mut show) = seeded_library(&config).await;
    show.tmdb_id = Some(42);
    library.update_show(show.clone()).await.unwrap();

    // A second show so the scan has a checkpoint left to hit.
    let folder = config.library.root.clone().unwrap().join("Lost");
    std::fs::create_dir_all(&folder).unwrap();
    let mut second = Show::new("Lost", folder);
    second.tmdb_id = Some(42);
    library.add_show(second).await;

    let (scanner, queue) = make_scanner(
        Arc::clone(&library),
        &config,
        MockProvider::slow(Duration::from_millis(300)),
    );

    // An action enqueued before the scan must survive cancellation.
    queue
        .propose(Action::place(
            dir.path().join("incoming/Severance.S01E01.mkv"),
            show.folder.join("Season 01/Severance - S01E01.mkv"),
            slot(&show, 1, 1),
        ))
        .await;

    let run = {
        let scanner = Arc::clone(&scanner);
        tokio::spawn(async move { scanner.run(ScanStrategy::Full).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    scanner.cancel();

    let report = run.await.unwrap().unwrap();
    assert!(report.cancelled);
    assert_eq!(report.shows_scanned, 1);
    assert_eq!(queue.pending().await.len(), 1);

    let status = scanner.status().await;
    assert!(!status.running);
    assert!(status.result.unwrap().cancelled);
}

#[tokio::test]
async fn scan_report_separates_unmatched_from_quality_rejects() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = test_config(dir.path());
    let (library, mut show) = seeded_library(&config).await;
    show.tmdb_id = Some(42);
    library.update_show(show.clone()).await.unwrap();

    // S01E02 already holds a 1080p file on disk.
    let incumbent = show.folder.join("Season 01/Severance - S01E02.mkv");
    std::fs::create_dir_all(incumbent.parent().unwrap()).unwrap();
    std::fs::write(&incumbent, vec![0u8; 4096]).unwrap();
    library
        .attach_file(
            &slot(&show, 1, 2),
            incumbent.clone(),
            Some(QualityProfile {
                resolution: Some(Resolution::P1080),
                ..QualityProfile::default()
            }),
            true,
            config.today(),
        )
        .await
        .unwrap();

    // A losing 720p duplicate and a file no grammar matches.
    std::fs::write(
        show.folder.join("Severance.S01E02.720p.x264.mkv"),
        vec![0u8; 4096],
    )
    .unwrap();
    std::fs::write(show.folder.join("random clip.mkv"), vec![0u8; 4096]).unwrap();

    let (scanner, _queue) = make_scanner(Arc::clone(&library), &config, MockProvider::new());
    let report = scanner.run(ScanStrategy::Full).await.unwrap();

    assert_eq!(report.episodes_matched, 0);
    assert_eq!(report.unmatched_files, 1);
    assert_eq!(report.quality_rejects, 1);
    assert!(incumbent.exists());
}

#[tokio::test]
async fn discover_imports_new_show_and_skips_tracked_folders() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = test_config(dir.path());
    let library = Arc::new(Library::new());
    std::fs::create_dir_all(dir.path().join("library/Severance (2022)")).unwrap();
    std::fs::create_dir_all(dir.path().join("library/Unknown Show")).unwrap();

    let (scanner, _queue) = make_scanner(Arc::clone(&library), &config, MockProvider::new());
    let report = scanner.run(ScanStrategy::Discover).await.unwrap();

    let added = report
        .discovered
        .iter()
        .find(|d| d.folder == "Severance (2022)")
        .unwrap();
    assert!(matches!(added.outcome, DiscoveryOutcome::Added(_)));

    let not_found = report
        .discovered
        .iter()
        .find(|d| d.folder == "Unknown Show")
        .unwrap();
    assert_eq!(not_found.outcome, DiscoveryOutcome::NotFound);

    let shows = library.shows().await;
    assert_eq!(shows.len(), 1);
    assert_eq!(shows[0].tmdb_id, Some(42));
    assert_eq!(library.episodes_for_show(&shows[0].id).await.len(), 3);

    // A second discovery run finds the folder already tracked.
    let report = scanner.run(ScanStrategy::Discover).await.unwrap();
    let existing = report
        .discovered
        .iter()
        .find(|d| d.folder == "Severance (2022)")
        .unwrap();
    assert_eq!(existing.outcome, DiscoveryOutcome::Existing);
    assert_eq!(library.shows().await.len(), 1);
}
