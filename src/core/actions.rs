//! Action queue.
//!
//! The single gate through which the watcher and the scanner mutate the
//! filesystem. Intents are recorded as pending actions; approval executes
//! the move, updates the episode record and archives the action as one
//! logical unit. A failed filesystem operation archives the action too
//! (no automatic retry) and leaves the episode record unchanged.

use crate::models::action::{Action, ActionKind, ApproveAllResult, IssueReason};
use crate::models::config::{Config, IssuesOrganization, LibraryConfig, SupersededPolicy};
use crate::models::log::{LogResult, WatcherEvent, WatcherLogEntry};
use crate::store::Library;
use crate::utils::fs;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Compute the Issues-folder destination for a quarantined file.
pub fn issues_destination(
    issues_folder: &Path,
    organization: IssuesOrganization,
    reason: IssueReason,
    filename: &str,
    today: chrono::NaiveDate,
) -> PathBuf {
    match organization {
        IssuesOrganization::ByDate => issues_folder
            .join(today.format("%Y-%m-%d").to_string())
            .join(filename),
        IssuesOrganization::ByReason => issues_folder.join(reason.as_str()).join(filename),
        IssuesOrganization::Flat => issues_folder.join(filename),
    }
}

/// The action queue.
pub struct ActionQueue {
    library: Arc<Library>,
    config: LibraryConfig,
    issues_folder: Option<PathBuf>,
    issues_organization: IssuesOrganization,
    timezone_offset_minutes: i32,
    /// Folders the empty-parent cleanup must never remove.
    protected_roots: Vec<PathBuf>,
}

impl ActionQueue {
    /// Create a queue bound to a library store.
    pub fn new(library: Arc<Library>, config: &Config) -> Self {
        let protected_roots = [
            config.watcher.watch_folder.clone(),
            config.watcher.issues_folder.clone(),
            config.library.root.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();
        Self {
            library,
            config: config.library.clone(),
            issues_folder: config.watcher.issues_folder.clone(),
            issues_organization: config.watcher.issues_organization,
            timezone_offset_minutes: config.timezone_offset_minutes,
            protected_roots,
        }
    }

    fn today(&self) -> chrono::NaiveDate {
        let offset = chrono::FixedOffset::east_opt(self.timezone_offset_minutes * 60)
            .unwrap_or_else(|| chrono::FixedOffset::east_opt(0).unwrap());
        chrono::Utc::now().with_timezone(&offset).date_naive()
    }

    /// Record a pending action. Returns the action id.
    pub async fn propose(&self, action: Action) -> String {
        tracing::debug!(
            "Proposed action: {:?} -> {:?}",
            action.source,
            action.destination
        );
        self.library.insert_action(action).await
    }

    /// Record an action and approve it immediately.
    pub async fn propose_approved(&self, action: Action) -> Result<String> {
        let id = self.propose(action).await;
        self.approve(&id).await?;
        Ok(id)
    }

    /// Approve and execute a pending action.
    ///
    /// The action is removed from the pending set atomically with
    /// execution; a second approval of the same id fails with
    /// `ActionNotFound`, so no action can execute twice.
    pub async fn approve(&self, id: &str) -> Result<()> {
        let action = self.library.take_pending(id).await?;

        match self.execute(&action).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!("Action {} failed: {}", action.id, e);
                self.library
                    .append_log(WatcherLogEntry::new(
                        WatcherEvent::Error,
                        LogResult::Error,
                        format!("action failed for {}: {}", action.source.display(), e),
                    ))
                    .await;
                Err(Error::ActionExecutionFailed(e.to_string()))
            }
        }
    }

    /// Reject a pending action. The file stays where it is.
    pub async fn reject(&self, id: &str) -> Result<()> {
        let action = self.library.reject_action(id).await?;
        tracing::info!("Rejected action {} ({:?})", action.id, action.source);
        Ok(())
    }

    /// Approve every pending action. Failures do not block the rest.
    pub async fn approve_all(&self) -> ApproveAllResult {
        let mut result = ApproveAllResult::default();
        for action in self.library.pending_actions().await {
            match self.approve(&action.id).await {
                Ok(()) => result.success += 1,
                Err(_) => result.failed += 1,
            }
        }
        result
    }

    /// Pending actions awaiting operator review.
    pub async fn pending(&self) -> Vec<Action> {
        self.library.pending_actions().await
    }

    async fn execute(&self, action: &Action) -> Result<()> {
        // The incumbent leaves first: the replacement often renders to
        // the very same destination path.
        if let Some(incumbent) = &action.supersedes {
            self.dispose_superseded(incumbent).await;
        }

        fs::move_file(&action.source, &action.destination)?;

        // Companions are best-effort once the main file has moved.
        for companion in &action.companions {
            if let Err(e) = fs::move_file(&companion.source, &companion.destination) {
                tracing::warn!(
                    "Companion move failed: {:?} - {}",
                    companion.source,
                    e
                );
            }
        }

        match &action.kind {
            ActionKind::PlaceInLibrary => {
                if let Some(slot) = &action.slot {
                    self.library
                        .attach_file(
                            slot,
                            action.destination.clone(),
                            action.quality.clone(),
                            true,
                            self.today(),
                        )
                        .await?;
                    self.library
                        .append_log(
                            WatcherLogEntry::new(
                                WatcherEvent::MovedToLibrary,
                                LogResult::Ok,
                                format!("placed {}", action.destination.display()),
                            )
                            .with_slot(slot.clone()),
                        )
                        .await;
                }
            }
            ActionKind::MoveToIssues { reason } => {
                self.library
                    .append_log(WatcherLogEntry::new(
                        WatcherEvent::MovedToIssues,
                        LogResult::Issue,
                        format!(
                            "{}: {}",
                            reason,
                            action.source.display()
                        ),
                    ))
                    .await;
            }
        }

        if self.config.delete_empty_folders {
            let mut protected = self.protected_roots.clone();
            for show in self.library.shows().await {
                protected.push(show.folder.clone());
            }
            fs::delete_empty_parent(&action.source, &protected);
        }

        Ok(())
    }

    /// Apply the configured policy to a superseded incumbent file.
    async fn dispose_superseded(&self, incumbent: &Path) {
        match self.config.superseded_policy {
            SupersededPolicy::Leave => {}
            SupersededPolicy::Delete => {
                if let Err(e) = std::fs::remove_file(incumbent) {
                    tracing::warn!("Could not delete superseded file {:?}: {}", incumbent, e);
                }
            }
            SupersededPolicy::MoveToIssues => {
                let Some(issues) = &self.issues_folder else {
                    tracing::warn!("No Issues folder configured; leaving superseded file");
                    return;
                };
                let filename = incumbent
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let destination = issues_destination(
                    issues,
                    self.issues_organization,
                    IssueReason::LowerOrEqualQuality,
                    &filename,
                    self.today(),
                );
                if let Err(e) = fs::move_file(incumbent, &destination) {
                    tracing::warn!("Could not quarantine superseded file {:?}: {}", incumbent, e);
                }
            }
        }
    }
}
