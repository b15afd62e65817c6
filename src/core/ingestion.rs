//! File-ingestion state machine.
//!
//! Each detected path walks Detected → Stabilizing → Identified →
//! QualityDecision → {Placed, Issued, Skipped, Dropped}. Decision-level
//! outcomes are terminal states, never errors, and every terminal state
//! leaves a watcher log entry. The QualityDecision step for a given
//! (show, season, episode) slot runs under a per-slot lock so two files
//! racing for the same slot are serialized.

use crate::core::actions::{issues_destination, ActionQueue};
use crate::core::comparator::{self, Winner};
use crate::core::parser;
use crate::generators::{filename, folder};
use crate::models::action::{Action, CompanionMove, IssueReason};
use crate::models::config::Config;
use crate::models::episode::SlotKey;
use crate::models::log::{LogResult, WatcherEvent, WatcherLogEntry};
use crate::models::quality::QualityProfile;
use crate::models::show::Show;
use crate::store::Library;
use crate::utils::fs as fsutil;
use crate::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Live counters reported by the watcher runtime state.
#[derive(Debug, Default)]
pub struct WatcherCounters {
    /// Files currently in the Stabilizing state.
    pub stabilizing: AtomicUsize,
    /// Files past stabilization, waiting on or inside the decision step.
    pub queued: AtomicUsize,
}

/// Terminal state of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A placement action was enqueued (and possibly auto-approved).
    Placed { action_id: String },
    /// The file was quarantined.
    Issued { reason: IssueReason },
    /// Below the minimum size threshold; discarded as a sample.
    Skipped,
    /// Show opted out of renaming; file recorded or left untouched.
    Dropped,
}

/// The file-ingestion state machine.
pub struct Ingestor {
    library: Arc<Library>,
    queue: Arc<ActionQueue>,
    config: Config,
    sample_interval: Duration,
    counters: Arc<WatcherCounters>,
    slot_locks: Mutex<HashMap<SlotKey, Arc<Mutex<()>>>>,
}

impl Ingestor {
    /// Create an ingestor.
    pub fn new(
        library: Arc<Library>,
        queue: Arc<ActionQueue>,
        config: Config,
        counters: Arc<WatcherCounters>,
    ) -> Self {
        let sample_interval = Duration::from_secs(config.watcher.sample_interval_secs.max(1));
        Self {
            library,
            queue,
            config,
            sample_interval,
            counters,
            slot_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Override the stabilization sample interval (tests).
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Run one detected path through the whole state machine.
    pub async fn ingest_path(&self, path: &Path) -> Result<IngestOutcome> {
        self.library
            .append_log(WatcherLogEntry::new(
                WatcherEvent::Detected,
                LogResult::Ok,
                format!("detected {}", path.display()),
            ))
            .await;

        if !self.stabilize(path).await? {
            // Too small: a sample. Terminally discarded, logged as
            // skipped, never surfaces as an issue.
            self.library
                .append_log(WatcherLogEntry::new(
                    WatcherEvent::Skipped,
                    LogResult::Skipped,
                    format!("below size threshold: {}", path.display()),
                ))
                .await;
            return Ok(IngestOutcome::Skipped);
        }

        self.counters.queued.fetch_add(1, Ordering::SeqCst);
        let outcome = self.identify_and_decide(path, None).await;
        self.counters.queued.fetch_sub(1, Ordering::SeqCst);
        outcome
    }

    /// Decide an at-rest file, as scans do: no stabilization step.
    pub async fn ingest_at_rest(&self, path: &Path, show: &Show) -> Result<IngestOutcome> {
        self.identify_and_decide(path, Some(show)).await
    }

    /// Sample the file size until it is unchanged across two consecutive
    /// samples. Returns false when the settled size is below the
    /// minimum-file-size threshold.
    async fn stabilize(&self, path: &Path) -> Result<bool> {
        self.counters.stabilizing.fetch_add(1, Ordering::SeqCst);
        let result = self.stabilize_inner(path).await;
        self.counters.stabilizing.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn stabilize_inner(&self, path: &Path) -> Result<bool> {
        let mut last_size = std::fs::metadata(path)?.len();
        loop {
            tokio::time::sleep(self.sample_interval).await;
            let size = std::fs::metadata(path)?.len();
            if size == last_size {
                return Ok(size >= self.config.watcher.min_file_size_bytes);
            }
            last_size = size;
        }
    }

    /// Identify the episode slot and run the quality decision.
    async fn identify_and_decide(
        &self,
        path: &Path,
        show_hint: Option<&Show>,
    ) -> Result<IngestOutcome> {
        let Some((show, slot)) = self.identify(path, show_hint).await else {
            return self.issue(path, IssueReason::Unmatched).await;
        };

        self.library
            .append_log(
                WatcherLogEntry::new(
                    WatcherEvent::Matched,
                    LogResult::Ok,
                    format!("matched {}", path.display()),
                )
                .with_slot(slot.clone()),
            )
            .await;

        // Serialize the decision for this slot.
        let lock = self.slot_lock(&slot).await;
        let _guard = lock.lock().await;
        self.decide(path, &show, &slot).await
    }

    /// Match a path to a tracked show and an expected episode slot.
    async fn identify(&self, path: &Path, show_hint: Option<&Show>) -> Option<(Show, SlotKey)> {
        let numbers = parser::parse_episode_numbers(path)?;

        let show = match show_hint {
            Some(show) => show.clone(),
            None => {
                let filename = path.file_name()?.to_string_lossy().to_string();
                let name = parser::parse_show_name(&filename)?;
                self.find_show(&name).await?
            }
        };

        let slot = SlotKey {
            show_id: show.id.clone(),
            season: numbers.season,
            episode: numbers.episode,
        };
        // Only expected episodes are matchable.
        self.library.get_episode(&slot).await?;
        Some((show, slot))
    }

    async fn find_show(&self, parsed_name: &str) -> Option<Show> {
        let target = parser::normalize_show_name(parsed_name);
        for show in self.library.shows().await {
            if parser::normalize_show_name(&show.title) == target {
                return Some(show);
            }
        }
        None
    }

    /// QualityDecision: compare against any incumbent and emit the
    /// placement or issue intent.
    async fn decide(&self, path: &Path, show: &Show, slot: &SlotKey) -> Result<IngestOutcome> {
        let episode = self
            .library
            .get_episode(slot)
            .await
            .ok_or(crate::Error::UnknownEpisode {
                season: slot.season,
                episode: slot.episode,
            })?;

        let quality = self.probe_quality(path);

        let supersedes = if let (Some(incumbent_path), Some(incumbent_quality)) =
            (&episode.file_path, &episode.quality)
        {
            let comparison = comparator::compare(
                &quality,
                incumbent_quality,
                &self.config.quality.priority,
                &self.config.quality.codecs,
            );
            tracing::debug!(
                "Quality decision for {}: {:?} (deciding: {:?})",
                slot,
                comparison.winner,
                comparison.deciding_factor
            );
            match comparison.winner {
                Winner::Candidate => Some(incumbent_path.clone()),
                Winner::Incumbent | Winner::Tie => {
                    if !show.do_rename {
                        // Opted out of renaming: drop from tracking
                        // without touching the file.
                        self.library
                            .append_log(
                                WatcherLogEntry::new(
                                    WatcherEvent::Skipped,
                                    LogResult::Skipped,
                                    format!("not replacing incumbent: {}", path.display()),
                                )
                                .with_slot(slot.clone()),
                            )
                            .await;
                        return Ok(IngestOutcome::Dropped);
                    }
                    return self.issue(path, IssueReason::LowerOrEqualQuality).await;
                }
            }
        } else if episode.file_path.is_some() {
            // Incumbent with unknown quality: candidate with any known
            // quality wins a factor, so compare against an empty profile.
            let comparison = comparator::compare(
                &quality,
                &QualityProfile::default(),
                &self.config.quality.priority,
                &self.config.quality.codecs,
            );
            match comparison.winner {
                Winner::Candidate => episode.file_path.clone(),
                Winner::Incumbent | Winner::Tie => {
                    if !show.do_rename {
                        return Ok(IngestOutcome::Dropped);
                    }
                    return self.issue(path, IssueReason::LowerOrEqualQuality).await;
                }
            }
        } else {
            None
        };

        if !show.do_rename {
            // No filesystem mutation for opted-out shows: record the
            // file where it lies.
            self.library
                .attach_file(
                    slot,
                    path.to_path_buf(),
                    Some(quality),
                    false,
                    self.config.today(),
                )
                .await?;
            return Ok(IngestOutcome::Dropped);
        }

        self.place(path, show, slot, quality, supersedes).await
    }

    /// Enqueue the placement action, auto-approving when configured.
    async fn place(
        &self,
        path: &Path,
        show: &Show,
        slot: &SlotKey,
        quality: QualityProfile,
        supersedes: Option<PathBuf>,
    ) -> Result<IngestOutcome> {
        let episode = self
            .library
            .get_episode(slot)
            .await
            .ok_or(crate::Error::UnknownEpisode {
                season: slot.season,
                episode: slot.episode,
            })?;

        let extension = fsutil::get_extension(path).unwrap_or_else(|| "mkv".to_string());
        let destination = folder::season_dir(show, slot.season).join(
            filename::generate_episode_filename(show, &episode, Some(&quality), &extension),
        );

        let mut action = Action::place(path.to_path_buf(), destination.clone(), slot.clone());
        action.quality = Some(quality);
        action.supersedes = supersedes;
        action.companions = self.companions_for(path, &destination);

        let action_id = if self.config.watcher.auto_approve {
            self.queue.propose_approved(action).await?
        } else {
            self.queue.propose(action).await
        };

        Ok(IngestOutcome::Placed { action_id })
    }

    /// Enqueue a move-to-issues action. Issues are always auto-approved.
    async fn issue(&self, path: &Path, reason: IssueReason) -> Result<IngestOutcome> {
        let Some(issues_folder) = self.config.watcher.issues_folder.clone() else {
            return Err(crate::Error::PrerequisitesNotMet(
                "no Issues folder configured".to_string(),
            ));
        };
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let destination = issues_destination(
            &issues_folder,
            self.config.watcher.issues_organization,
            reason,
            &filename,
            self.config.today(),
        );

        let mut action = Action::issue(path.to_path_buf(), destination.clone(), reason);
        action.companions = self.companions_for(path, &destination);
        self.queue.propose_approved(action).await?;

        Ok(IngestOutcome::Issued { reason })
    }

    /// Build a quality profile for a file. With no probe collaborator
    /// wired in, quality tokens come from the filename; sidecar subtitles
    /// count as subtitle presence.
    fn probe_quality(&self, path: &Path) -> QualityProfile {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut quality = parser::parse_quality(&filename);
        if !quality.has_subtitles {
            quality.has_subtitles = self
                .sibling_companions(path)
                .iter()
                .any(|p| matches!(fsutil::get_extension(p).as_deref(), Some("srt" | "ass" | "sub")));
        }
        quality
    }

    /// Companion files sharing the main file's stem, filtered to the
    /// configured extension allow-list.
    fn sibling_companions(&self, path: &Path) -> Vec<PathBuf> {
        let Some(parent) = path.parent() else {
            return Vec::new();
        };
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            return Vec::new();
        };

        let mut companions = Vec::new();
        let Ok(entries) = std::fs::read_dir(parent) else {
            return companions;
        };
        for entry in entries.flatten() {
            let candidate = entry.path();
            if candidate == path {
                continue;
            }
            let same_stem = candidate
                .file_stem()
                .map(|s| s.to_string_lossy().starts_with(&stem))
                .unwrap_or(false);
            let allowed = fsutil::get_extension(&candidate)
                .map(|ext| self.config.watcher.companion_extensions.contains(&ext))
                .unwrap_or(false);
            if same_stem && allowed {
                companions.push(candidate);
            }
        }
        companions.sort();
        companions
    }

    /// Source→destination transforms for companion files, mirroring the
    /// main file's rename.
    fn companions_for(&self, source: &Path, destination: &Path) -> Vec<CompanionMove> {
        let Some(dest_stem) = destination
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
        else {
            return Vec::new();
        };
        let dest_dir = destination.parent().unwrap_or(Path::new("."));

        self.sibling_companions(source)
            .into_iter()
            .filter_map(|companion| {
                let ext = fsutil::get_extension(&companion)?;
                Some(CompanionMove {
                    destination: dest_dir.join(format!("{}.{}", dest_stem, ext)),
                    source: companion,
                })
            })
            .collect()
    }

    async fn slot_lock(&self, slot: &SlotKey) -> Arc<Mutex<()>> {
        let mut locks = self.slot_locks.lock().await;
        locks
            .entry(slot.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
