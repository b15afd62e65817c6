//! Scan orchestrator.
//!
//! On-demand reconciliation runs. A strategy picks the shows and
//! episodes in scope; each run refreshes provider metadata, enumerates
//! the files already on disk and routes them through the same quality
//! decision the watcher uses (no stabilization step, the files are at
//! rest). At most one scan runs process-wide; a second request is
//! rejected, not queued.

use crate::core::expectation;
use crate::core::ingestion::{IngestOutcome, Ingestor};
use crate::core::parser;
use crate::models::action::IssueReason;
use crate::models::config::Config;
use crate::models::episode::SlotKey;
use crate::models::show::Show;
use crate::services::provider::MetadataProvider;
use crate::store::Library;
use crate::utils::fs as fsutil;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use walkdir::WalkDir;

/// Which shows and episodes a scan covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStrategy {
    /// Every show, every expected episode.
    Full,
    /// Every show, but only episodes aired within the recency window.
    Quick,
    /// Shows whose provider status is not ended or canceled.
    Ongoing,
    /// An explicit list of episode slots.
    Selected(Vec<SlotKey>),
    /// Import shows inferred from library subfolder names.
    Discover,
}

impl ScanStrategy {
    fn label(&self) -> &'static str {
        match self {
            ScanStrategy::Full => "full",
            ScanStrategy::Quick => "quick",
            ScanStrategy::Ongoing => "ongoing",
            ScanStrategy::Selected(_) => "selected",
            ScanStrategy::Discover => "discover",
        }
    }
}

/// Per-folder outcome of a library-folder-discovery run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "detail")]
pub enum DiscoveryOutcome {
    /// A new show was imported.
    Added(String),
    /// The folder already maps to a tracked show.
    Existing,
    /// The provider had no match for the folder name.
    NotFound,
    /// The lookup or import failed.
    Error(String),
}

/// One discovered folder and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredFolder {
    pub folder: String,
    pub outcome: DiscoveryOutcome,
}

/// Structured result of a completed scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub shows_scanned: usize,
    pub episodes_matched: usize,
    /// Files quarantined because no episode slot could be identified.
    pub unmatched_files: usize,
    /// Files quarantined for losing the quality comparison.
    pub quality_rejects: usize,
    pub errors: usize,
    pub cancelled: bool,
    pub discovered: Vec<DiscoveredFolder>,
}

/// Point-in-time scan status, safe for concurrent polling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanStatus {
    pub running: bool,
    /// 0-100.
    pub progress: u8,
    pub message: String,
    pub result: Option<ScanReport>,
}

/// The scan orchestrator.
pub struct ScanOrchestrator {
    library: Arc<Library>,
    ingestor: Arc<Ingestor>,
    provider: Arc<dyn MetadataProvider>,
    config: Config,
    scan_lock: AtomicBool,
    cancel: AtomicBool,
    status: RwLock<ScanStatus>,
}

impl ScanOrchestrator {
    pub fn new(
        library: Arc<Library>,
        ingestor: Arc<Ingestor>,
        provider: Arc<dyn MetadataProvider>,
        config: Config,
    ) -> Self {
        Self {
            library,
            ingestor,
            provider,
            config,
            scan_lock: AtomicBool::new(false),
            cancel: AtomicBool::new(false),
            status: RwLock::new(ScanStatus::default()),
        }
    }

    /// Current status snapshot.
    pub async fn status(&self) -> ScanStatus {
        self.status.read().await.clone()
    }

    /// Request cancellation of the running scan. Already-enqueued
    /// actions stay enqueued; the scan just stops producing new work.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Run a scan. Fails with `ConcurrentScanRejected` if one is
    /// already running.
    pub async fn run(&self, strategy: ScanStrategy) -> Result<ScanReport> {
        if self
            .scan_lock
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::ConcurrentScanRejected);
        }
        self.cancel.store(false, Ordering::SeqCst);
        self.set_status(true, 0, format!("{} scan starting", strategy.label()))
            .await;
        tracing::info!("Starting {} scan", strategy.label());

        let result = self.run_inner(&strategy).await;

        match &result {
            Ok(report) => {
                let mut status = self.status.write().await;
                status.running = false;
                status.progress = 100;
                status.message = if report.cancelled {
                    format!("{} scan cancelled", strategy.label())
                } else {
                    format!("{} scan complete", strategy.label())
                };
                status.result = Some(report.clone());
            }
            Err(e) => {
                let mut status = self.status.write().await;
                status.running = false;
                status.message = format!("{} scan failed: {}", strategy.label(), e);
            }
        }
        self.scan_lock.store(false, Ordering::SeqCst);
        result
    }

    async fn run_inner(&self, strategy: &ScanStrategy) -> Result<ScanReport> {
        let mut report = ScanReport::default();

        if let ScanStrategy::Discover = strategy {
            self.discover(&mut report).await?;
        }

        let shows = self.shows_in_scope(strategy).await;
        let total = shows.len().max(1);

        for (index, show) in shows.iter().enumerate() {
            if self.cancel.load(Ordering::SeqCst) {
                report.cancelled = true;
                break;
            }
            self.set_status(
                true,
                ((index * 100) / total) as u8,
                format!("Scanning {}", show.title),
            )
            .await;

            if let Err(e) = self.refresh_show(show).await {
                // Transient metadata failures never abort the batch.
                tracing::warn!("Metadata refresh failed for {}: {}", show.title, e);
                report.errors += 1;
            }
            self.scan_show_folder(show, strategy, &mut report).await;
            report.shows_scanned += 1;
        }

        Ok(report)
    }

    /// Refresh the expectation model for one show from the provider.
    async fn refresh_show(&self, show: &Show) -> Result<()> {
        let Some(provider_id) = show.tmdb_id else {
            return Ok(());
        };
        let snapshot = self.provider.fetch_show(provider_id).await?;
        expectation::reconcile_show(&self.library, show, &snapshot, self.config.today()).await?;
        Ok(())
    }

    /// Walk one show's folder and decide every video file in scope.
    async fn scan_show_folder(&self, show: &Show, strategy: &ScanStrategy, report: &mut ScanReport) {
        if !show.folder.is_dir() {
            return;
        }

        for entry in WalkDir::new(&show.folder)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            if self.cancel.load(Ordering::SeqCst) {
                report.cancelled = true;
                return;
            }
            let path = entry.path();
            if !fsutil::is_video_file(path) {
                continue;
            }
            if !self.in_scope(show, path, strategy).await {
                continue;
            }
            if self.is_tracked_at(show, path).await {
                // Already placed here; nothing to decide.
                continue;
            }

            match self.ingestor.ingest_at_rest(path, show).await {
                Ok(IngestOutcome::Placed { .. }) => report.episodes_matched += 1,
                Ok(IngestOutcome::Issued { reason }) => match reason {
                    IssueReason::LowerOrEqualQuality => report.quality_rejects += 1,
                    _ => report.unmatched_files += 1,
                },
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Scan decision failed for {:?}: {}", path, e);
                    report.errors += 1;
                }
            }
        }
    }

    /// Whether this on-disk path is already the tracked file for its slot.
    async fn is_tracked_at(&self, show: &Show, path: &Path) -> bool {
        let Some(numbers) = parser::parse_episode_numbers(path) else {
            return false;
        };
        let slot = SlotKey {
            show_id: show.id.clone(),
            season: numbers.season,
            episode: numbers.episode,
        };
        match self.library.get_episode(&slot).await {
            Some(episode) => episode.file_path.as_deref() == Some(path),
            None => false,
        }
    }

    /// Strategy predicate for one file's episode scope.
    async fn in_scope(&self, show: &Show, path: &Path, strategy: &ScanStrategy) -> bool {
        match strategy {
            ScanStrategy::Full | ScanStrategy::Ongoing | ScanStrategy::Discover => true,
            ScanStrategy::Quick => {
                let Some(numbers) = parser::parse_episode_numbers(path) else {
                    // Unmatchable files still flow through so they reach
                    // the unmatched terminal.
                    return true;
                };
                let slot = SlotKey {
                    show_id: show.id.clone(),
                    season: numbers.season,
                    episode: numbers.episode,
                };
                let Some(episode) = self.library.get_episode(&slot).await else {
                    return true;
                };
                let window =
                    chrono::Duration::days(i64::from(self.config.scan.recency_window_days));
                match episode.air_date {
                    Some(aired) => aired >= self.config.today() - window,
                    None => false,
                }
            }
            ScanStrategy::Selected(slots) => {
                let Some(numbers) = parser::parse_episode_numbers(path) else {
                    return false;
                };
                slots.iter().any(|s| {
                    s.show_id == show.id && s.season == numbers.season && s.episode == numbers.episode
                })
            }
        }
    }

    /// Shows selected by the strategy's show predicate.
    async fn shows_in_scope(&self, strategy: &ScanStrategy) -> Vec<Show> {
        let shows = self.library.shows().await;
        match strategy {
            ScanStrategy::Full | ScanStrategy::Quick | ScanStrategy::Discover => shows,
            ScanStrategy::Ongoing => shows.into_iter().filter(|s| s.status.is_ongoing()).collect(),
            ScanStrategy::Selected(slots) => shows
                .into_iter()
                .filter(|show| slots.iter().any(|s| s.show_id == show.id))
                .collect(),
        }
    }

    /// Library-folder discovery: import shows from subfolder names.
    async fn discover(&self, report: &mut ScanReport) -> Result<()> {
        let Some(root) = self.config.library.root.clone() else {
            return Err(Error::PrerequisitesNotMet(
                "no library root configured".to_string(),
            ));
        };
        fsutil::ensure_directory(&root)?;

        let limit = self.config.scan.discovery_batch_limit.unwrap_or(usize::MAX);
        let mut imported = 0usize;

        let mut folders: Vec<_> = std::fs::read_dir(&root)?
            .flatten()
            .filter(|e| e.path().is_dir())
            .map(|e| e.path())
            .collect();
        folders.sort();

        for folder in folders {
            if self.cancel.load(Ordering::SeqCst) {
                report.cancelled = true;
                break;
            }
            if imported >= limit {
                break;
            }
            let name = folder
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let parsed = parser::parse_show_folder(&name);

            if self.folder_is_tracked(&parsed.title).await {
                report.discovered.push(DiscoveredFolder {
                    folder: name,
                    outcome: DiscoveryOutcome::Existing,
                });
                continue;
            }

            let outcome = match self.import_show(&parsed.title, parsed.year, &folder).await {
                Ok(Some(show_id)) => {
                    imported += 1;
                    DiscoveryOutcome::Added(show_id)
                }
                Ok(None) => DiscoveryOutcome::NotFound,
                Err(e) => {
                    report.errors += 1;
                    DiscoveryOutcome::Error(e.to_string())
                }
            };
            report.discovered.push(DiscoveredFolder {
                folder: name,
                outcome,
            });
        }
        Ok(())
    }

    async fn folder_is_tracked(&self, title: &str) -> bool {
        let target = parser::normalize_show_name(title);
        self.library
            .shows()
            .await
            .iter()
            .any(|s| parser::normalize_show_name(&s.title) == target)
    }

    /// Look up a folder's title with the provider and import the best
    /// candidate, folding in its expected episodes.
    async fn import_show(
        &self,
        title: &str,
        year: Option<u16>,
        folder: &Path,
    ) -> Result<Option<String>> {
        let candidates = self.provider.search_shows(title).await?;
        let candidate = match year {
            Some(year) => candidates
                .iter()
                .find(|c| {
                    c.first_air_date
                        .map(|d| chrono::Datelike::year(&d) == i32::from(year))
                        .unwrap_or(false)
                })
                .or_else(|| candidates.first()),
            None => candidates.first(),
        };
        let Some(candidate) = candidate else {
            return Ok(None);
        };

        let snapshot = self.provider.fetch_show(candidate.provider_id).await?;
        let mut show = Show::new(&candidate.title, folder.to_path_buf());
        show.tmdb_id = Some(candidate.provider_id);
        let show_id = self.library.add_show(show.clone()).await;
        expectation::reconcile_show(&self.library, &show, &snapshot, self.config.today()).await?;
        tracing::info!("Imported show {} from folder {:?}", candidate.title, folder);
        Ok(Some(show_id))
    }

    async fn set_status(&self, running: bool, progress: u8, message: String) {
        let mut status = self.status.write().await;
        status.running = running;
        status.progress = progress.min(100);
        status.message = message;
    }
}
