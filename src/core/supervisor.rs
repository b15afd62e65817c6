//! Watcher supervisor.
//!
//! Owns the Stopped ⇄ Running lifecycle of the background watcher.
//! `start` verifies prerequisites and spawns the event loop; `stop` is
//! always permitted and drains in-flight ingestions before returning, so
//! no file is left mid-move. Runtime state is an explicit snapshot
//! queryable by any observer, not an ambient flag.

use crate::core::ingestion::{Ingestor, WatcherCounters};
use crate::models::config::Config;
use crate::models::log::{LogResult, WatcherEvent, WatcherLogEntry};
use crate::services::events::EventReceiver;
use crate::store::Library;
use crate::utils::fs as fsutil;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use walkdir::WalkDir;

/// Point-in-time watcher state, safe for concurrent polling.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatcherRuntimeState {
    pub running: bool,
    /// Files currently being size-sampled.
    pub stabilizing: usize,
    /// Files waiting on or inside the quality decision.
    pub queued: usize,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Prerequisite verdicts, re-evaluated at snapshot time.
    pub checks: Vec<PrereqCheck>,
}

impl WatcherRuntimeState {
    /// Whether every prerequisite currently holds.
    pub fn prerequisites_met(&self) -> bool {
        self.checks.iter().all(|c| c.ok)
    }
}

/// One prerequisite verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrereqCheck {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

/// Evaluate every watcher prerequisite against the configuration.
pub fn check_prerequisites(config: &Config) -> Vec<PrereqCheck> {
    let mut checks = Vec::new();

    match &config.watcher.watch_folder {
        Some(folder) => {
            let verdict = fsutil::ensure_directory(folder)
                .and_then(|()| std::fs::read_dir(folder).map(|_| ()).map_err(Into::into));
            checks.push(PrereqCheck {
                name: "watch folder".to_string(),
                ok: verdict.is_ok(),
                detail: match verdict {
                    Ok(()) => folder.display().to_string(),
                    Err(e) => e.to_string(),
                },
            });
        }
        None => checks.push(PrereqCheck {
            name: "watch folder".to_string(),
            ok: false,
            detail: "not configured".to_string(),
        }),
    }

    match &config.watcher.issues_folder {
        Some(folder) => checks.push(PrereqCheck {
            name: "issues folder".to_string(),
            ok: true,
            detail: folder.display().to_string(),
        }),
        None => checks.push(PrereqCheck {
            name: "issues folder".to_string(),
            ok: false,
            detail: "not configured".to_string(),
        }),
    }

    checks.push(PrereqCheck {
        name: "library root".to_string(),
        ok: config.library.root.is_some(),
        detail: config
            .library
            .root
            .as_ref()
            .map(|r| r.display().to_string())
            .unwrap_or_else(|| "not configured".to_string()),
    });

    checks
}

/// The watcher supervisor.
pub struct WatcherSupervisor {
    library: Arc<Library>,
    ingestor: Arc<Ingestor>,
    config: Config,
    counters: Arc<WatcherCounters>,
    running: AtomicBool,
    started_at: Mutex<Option<chrono::DateTime<chrono::Utc>>>,
    shutdown: watch::Sender<bool>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl WatcherSupervisor {
    pub fn new(
        library: Arc<Library>,
        ingestor: Arc<Ingestor>,
        config: Config,
        counters: Arc<WatcherCounters>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            library,
            ingestor,
            config,
            counters,
            running: AtomicBool::new(false),
            started_at: Mutex::new(None),
            shutdown,
            loop_handle: Mutex::new(None),
        }
    }

    /// Current runtime-state snapshot, prerequisite verdicts included.
    pub async fn state(&self) -> WatcherRuntimeState {
        WatcherRuntimeState {
            running: self.running.load(Ordering::SeqCst),
            stabilizing: self.counters.stabilizing.load(Ordering::SeqCst),
            queued: self.counters.queued.load(Ordering::SeqCst),
            started_at: *self.started_at.lock().await,
            checks: check_prerequisites(&self.config),
        }
    }

    /// Start the watcher, consuming a filesystem event stream.
    ///
    /// Fails with `PrerequisitesNotMet` listing every failed check, or
    /// `WatcherAlreadyRunning` when already started.
    pub async fn start(self: &Arc<Self>, mut events: EventReceiver) -> Result<()> {
        let failed: Vec<String> = check_prerequisites(&self.config)
            .into_iter()
            .filter(|c| !c.ok)
            .map(|c| format!("{}: {}", c.name, c.detail))
            .collect();
        if !failed.is_empty() {
            return Err(Error::PrerequisitesNotMet(failed.join("; ")));
        }

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::WatcherAlreadyRunning);
        }
        let _ = self.shutdown.send(false);
        *self.started_at.lock().await = Some(chrono::Utc::now());

        self.library
            .append_log(WatcherLogEntry::new(
                WatcherEvent::Started,
                LogResult::Ok,
                "watcher started",
            ))
            .await;
        tracing::info!("Watcher started");

        let supervisor = Arc::clone(self);
        let mut shutdown = self.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            // Paths currently being ingested; duplicate events for them
            // are absorbed here.
            let in_flight: Arc<Mutex<HashSet<PathBuf>>> = Arc::new(Mutex::new(HashSet::new()));
            let mut tasks: JoinSet<()> = JoinSet::new();

            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    event = events.recv() => {
                        let Some(event) = event else { break };
                        if !fsutil::is_video_file(&event.path) {
                            continue;
                        }
                        {
                            let mut guard = in_flight.lock().await;
                            if !guard.insert(event.path.clone()) {
                                continue;
                            }
                        }
                        let ingestor = Arc::clone(&supervisor.ingestor);
                        let in_flight = Arc::clone(&in_flight);
                        tasks.spawn(async move {
                            if let Err(e) = ingestor.ingest_path(&event.path).await {
                                tracing::warn!("Ingestion failed for {:?}: {}", event.path, e);
                            }
                            in_flight.lock().await.remove(&event.path);
                        });
                    }
                }
            }

            // Graceful drain: in-flight files finish their current
            // cycle before the watcher halts.
            while tasks.join_next().await.is_some() {}
        });
        *self.loop_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Stop the watcher, waiting for in-flight ingestions to finish.
    /// Always permitted; a no-op when already stopped.
    pub async fn stop(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        let _ = self.shutdown.send(true);

        if let Some(handle) = self.loop_handle.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::warn!("Watcher loop task ended abnormally: {}", e);
            }
        }
        *self.started_at.lock().await = None;

        self.library
            .append_log(WatcherLogEntry::new(
                WatcherEvent::Stopped,
                LogResult::Ok,
                "watcher stopped",
            ))
            .await;
        tracing::info!("Watcher stopped");
        Ok(())
    }

    /// Delete Issues-folder entries older than the retention window.
    /// Returns the number of files removed. Retention 0 disables the
    /// sweep entirely.
    pub fn purge_issues(&self) -> Result<usize> {
        let retention_days = self.config.watcher.issues_retention_days;
        if retention_days == 0 {
            return Ok(0);
        }
        let Some(issues) = &self.config.watcher.issues_folder else {
            return Ok(0);
        };
        if !issues.is_dir() {
            return Ok(0);
        }

        let cutoff =
            std::time::SystemTime::now() - Duration::from_secs(u64::from(retention_days) * 86_400);
        let mut removed = 0usize;

        for entry in WalkDir::new(issues)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let old = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(|modified| modified < cutoff)
                .unwrap_or(false);
            if old {
                match std::fs::remove_file(entry.path()) {
                    Ok(()) => {
                        tracing::debug!("Purged {:?}", entry.path());
                        removed += 1;
                    }
                    Err(e) => tracing::warn!("Could not purge {:?}: {}", entry.path(), e),
                }
            }
        }
        if removed > 0 {
            tracing::info!("Purged {} expired Issues entries", removed);
        }
        Ok(removed)
    }

    /// Spawn the periodic auto-purge sweep. Scheduled independently of
    /// watcher start/stop; a no-op task when retention is 0.
    pub fn spawn_purge_sweep(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let supervisor = Arc::clone(self);
        tokio::spawn(async move {
            if supervisor.config.watcher.issues_retention_days == 0 {
                return;
            }
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = supervisor.purge_issues() {
                    tracing::warn!("Issues purge sweep failed: {}", e);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::ActionQueue;

    fn make_supervisor(config: Config) -> Arc<WatcherSupervisor> {
        let library = Arc::new(Library::new());
        let queue = Arc::new(ActionQueue::new(Arc::clone(&library), &config));
        let counters = Arc::new(WatcherCounters::default());
        let ingestor = Arc::new(Ingestor::new(
            Arc::clone(&library),
            queue,
            config.clone(),
            Arc::clone(&counters),
        ));
        Arc::new(WatcherSupervisor::new(library, ingestor, config, counters))
    }

    #[tokio::test]
    async fn test_snapshot_carries_failed_prerequisites() {
        let supervisor = make_supervisor(Config::default());

        let state = supervisor.state().await;
        assert!(!state.running);
        assert!(!state.prerequisites_met());
        let watch = state
            .checks
            .iter()
            .find(|c| c.name == "watch folder")
            .unwrap();
        assert!(!watch.ok);
        assert_eq!(watch.detail, "not configured");
    }

    #[tokio::test]
    async fn test_snapshot_carries_met_prerequisites() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.watcher.watch_folder = Some(dir.path().join("incoming"));
        config.watcher.issues_folder = Some(dir.path().join("issues"));
        config.library.root = Some(dir.path().join("library"));
        std::fs::create_dir_all(dir.path().join("incoming")).unwrap();

        let state = make_supervisor(config).state().await;
        assert_eq!(state.checks.len(), 3);
        assert!(state.prerequisites_met());
    }
}
