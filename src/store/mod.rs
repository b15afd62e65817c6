//! Library store.
//!
//! In-memory maps of shows, episodes, pending actions and watcher log
//! entries behind an async RwLock, persisted as a versioned JSON snapshot.
//! Any durable store satisfying these operations would do; this one keeps
//! the single-entity transactional contract by doing every mutation under
//! one write lock.

use crate::models::action::{Action, ActionStatus};
use crate::models::episode::{Episode, FileStatus, SlotKey};
use crate::models::log::WatcherLogEntry;
use crate::models::show::Show;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;

/// Snapshot schema version.
const SNAPSHOT_VERSION: &str = "1.0";

/// Per-show reconciliation summary exposed to the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    pub episodes_found: usize,
    pub episodes_missing: usize,
    pub episodes_not_aired: usize,
    pub episodes_special: usize,
    pub episodes_ignored: usize,
}

/// A page of log entries plus the total matching count.
#[derive(Debug, Clone)]
pub struct LogPage {
    pub entries: Vec<WatcherLogEntry>,
    pub total: usize,
}

/// Serialized snapshot of the whole library.
#[derive(Debug, Serialize, Deserialize)]
struct LibrarySnapshot {
    version: String,
    created_at: String,
    updated_at: String,
    shows: Vec<Show>,
    episodes: Vec<Episode>,
    actions: Vec<Action>,
    log: Vec<WatcherLogEntry>,
}

#[derive(Debug, Default)]
struct Inner {
    shows: HashMap<String, Show>,
    episodes: HashMap<SlotKey, Episode>,
    actions: Vec<Action>,
    log: Vec<WatcherLogEntry>,
}

/// The library store.
#[derive(Debug, Default)]
pub struct Library {
    inner: RwLock<Inner>,
}

impl Library {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    // ----- shows -----

    /// Add a show. Returns its id.
    pub async fn add_show(&self, show: Show) -> String {
        let id = show.id.clone();
        self.inner.write().await.shows.insert(id.clone(), show);
        id
    }

    /// Fetch a show by id.
    pub async fn get_show(&self, id: &str) -> Result<Show> {
        self.inner
            .read()
            .await
            .shows
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownShow(id.to_string()))
    }

    /// All tracked shows.
    pub async fn shows(&self) -> Vec<Show> {
        let mut shows: Vec<Show> = self.inner.read().await.shows.values().cloned().collect();
        shows.sort_by(|a, b| a.title.cmp(&b.title));
        shows
    }

    /// Find a show whose title matches, case-insensitively.
    pub async fn find_show_by_title(&self, title: &str) -> Option<Show> {
        self.inner
            .read()
            .await
            .shows
            .values()
            .find(|s| s.title.eq_ignore_ascii_case(title))
            .cloned()
    }

    /// Replace a show record.
    pub async fn update_show(&self, show: Show) -> Result<()> {
        let mut inner = self.inner.write().await;
        if !inner.shows.contains_key(&show.id) {
            return Err(Error::UnknownShow(show.id.clone()));
        }
        inner.shows.insert(show.id.clone(), show);
        Ok(())
    }

    /// Remove a show and its episodes. File deletion is never implied.
    pub async fn remove_show(&self, id: &str) -> Result<Show> {
        let mut inner = self.inner.write().await;
        let show = inner
            .shows
            .remove(id)
            .ok_or_else(|| Error::UnknownShow(id.to_string()))?;
        inner.episodes.retain(|slot, _| slot.show_id != id);
        Ok(show)
    }

    // ----- episodes -----

    /// Insert or replace an episode record.
    pub async fn upsert_episode(&self, episode: Episode) {
        self.inner
            .write()
            .await
            .episodes
            .insert(episode.slot(), episode);
    }

    /// Fetch an episode by slot.
    pub async fn get_episode(&self, slot: &SlotKey) -> Option<Episode> {
        self.inner.read().await.episodes.get(slot).cloned()
    }

    /// Episodes of one show, ordered by (season, number).
    pub async fn episodes_for_show(&self, show_id: &str) -> Vec<Episode> {
        let mut episodes: Vec<Episode> = self
            .inner
            .read()
            .await
            .episodes
            .values()
            .filter(|e| e.show_id == show_id)
            .cloned()
            .collect();
        episodes.sort_by_key(|e| (e.season, e.number));
        episodes
    }

    /// Record a file placement for an episode slot.
    ///
    /// Clears the missing state; callers pass the path the file ended up
    /// at and the quality that was measured or parsed for it. A slot
    /// whose air date is still after `today` keeps `NotAired` even with
    /// the file recorded; the found state appears once the date passes.
    pub async fn attach_file(
        &self,
        slot: &SlotKey,
        path: std::path::PathBuf,
        quality: Option<crate::models::quality::QualityProfile>,
        renamed: bool,
        today: chrono::NaiveDate,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let episode = inner.episodes.get_mut(slot).ok_or(Error::UnknownEpisode {
            season: slot.season,
            episode: slot.episode,
        })?;
        episode.file_path = Some(path);
        if quality.is_some() {
            episode.quality = quality;
        }
        episode.status = if !episode.is_aired(today) && !episode.is_special && !episode.is_ignored {
            FileStatus::NotAired
        } else if renamed {
            FileStatus::Renamed
        } else {
            FileStatus::Found
        };
        Ok(())
    }

    /// Reconciliation summary for one show. A show with missing-episode
    /// tracking disabled reports zero missing.
    pub async fn summary_for_show(&self, show_id: &str) -> ReconciliationSummary {
        let inner = self.inner.read().await;
        let track_missing = inner
            .shows
            .get(show_id)
            .map(|s| s.do_missing)
            .unwrap_or(true);
        let mut summary = ReconciliationSummary::default();
        for episode in inner.episodes.values().filter(|e| e.show_id == show_id) {
            if episode.is_ignored {
                summary.episodes_ignored += 1;
                continue;
            }
            if episode.is_special {
                summary.episodes_special += 1;
                continue;
            }
            match episode.status {
                FileStatus::Found | FileStatus::Renamed => summary.episodes_found += 1,
                FileStatus::Missing => {
                    if track_missing {
                        summary.episodes_missing += 1;
                    }
                }
                FileStatus::NotAired => summary.episodes_not_aired += 1,
            }
        }
        summary
    }

    // ----- actions -----

    /// Record a pending action. Returns its id.
    pub async fn insert_action(&self, action: Action) -> String {
        let id = action.id.clone();
        self.inner.write().await.actions.push(action);
        id
    }

    /// All pending actions, oldest first.
    pub async fn pending_actions(&self) -> Vec<Action> {
        self.inner
            .read()
            .await
            .actions
            .iter()
            .filter(|a| a.status == ActionStatus::Pending)
            .cloned()
            .collect()
    }

    /// Remove a pending action for execution. The removal is atomic with
    /// respect to other approvers: at most one caller gets the action.
    pub async fn take_pending(&self, id: &str) -> Result<Action> {
        let mut inner = self.inner.write().await;
        let pos = inner
            .actions
            .iter()
            .position(|a| a.id == id && a.status == ActionStatus::Pending)
            .ok_or_else(|| Error::ActionNotFound(id.to_string()))?;
        Ok(inner.actions.remove(pos))
    }

    /// Reject and drop a pending action.
    pub async fn reject_action(&self, id: &str) -> Result<Action> {
        let mut action = self.take_pending(id).await?;
        action.status = ActionStatus::Rejected;
        Ok(action)
    }

    // ----- watcher log -----

    /// Append a log entry.
    pub async fn append_log(&self, entry: WatcherLogEntry) {
        self.inner.write().await.log.push(entry);
    }

    /// Paginated log query filtered by an optional date range.
    pub async fn query_log(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        offset: usize,
        limit: usize,
    ) -> LogPage {
        let inner = self.inner.read().await;
        let matching: Vec<&WatcherLogEntry> = inner
            .log
            .iter()
            .filter(|e| from.map_or(true, |f| e.timestamp >= f))
            .filter(|e| to.map_or(true, |t| e.timestamp <= t))
            .collect();
        let total = matching.len();
        let entries = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        LogPage { entries, total }
    }

    /// Bulk-clear the log.
    pub async fn clear_log(&self) -> usize {
        let mut inner = self.inner.write().await;
        let count = inner.log.len();
        inner.log.clear();
        count
    }

    // ----- persistence -----

    /// Save a snapshot of the library to a JSON file.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let inner = self.inner.read().await;
        let snapshot = LibrarySnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            created_at: Utc::now().to_rfc3339(),
            updated_at: Utc::now().to_rfc3339(),
            shows: inner.shows.values().cloned().collect(),
            episodes: inner.episodes.values().cloned().collect(),
            actions: inner.actions.clone(),
            log: inner.log.clone(),
        };
        drop(inner);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&snapshot)?;
        std::fs::write(path, json)?;
        tracing::info!("Library snapshot saved to {:?}", path);
        Ok(())
    }

    /// Load a library from a JSON snapshot.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let snapshot: LibrarySnapshot = serde_json::from_str(&content)
            .map_err(|e| Error::InvalidSnapshot(e.to_string()))?;

        let library = Library::new();
        {
            let mut inner = library.inner.write().await;
            for show in snapshot.shows {
                inner.shows.insert(show.id.clone(), show);
            }
            for episode in snapshot.episodes {
                inner.episodes.insert(episode.slot(), episode);
            }
            inner.actions = snapshot.actions;
            inner.log = snapshot.log;
        }
        Ok(library)
    }

    /// Load a snapshot if it exists, otherwise start empty.
    pub async fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path).await
        } else {
            Ok(Self::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn show() -> Show {
        Show::new("Severance", PathBuf::from("/library/Severance"))
    }

    fn episode(show_id: &str, season: u16, number: u16, status: FileStatus) -> Episode {
        Episode {
            show_id: show_id.to_string(),
            season,
            number,
            title: format!("Episode {}", number),
            air_date: None,
            status,
            file_path: None,
            quality: None,
            is_ignored: false,
            is_special: false,
        }
    }

    #[tokio::test]
    async fn test_show_crud() {
        let library = Library::new();
        let id = library.add_show(show()).await;
        assert!(library.get_show(&id).await.is_ok());
        assert_eq!(library.shows().await.len(), 1);

        library.remove_show(&id).await.unwrap();
        assert!(library.get_show(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_summary_counts() {
        let library = Library::new();
        let id = library.add_show(show()).await;
        library
            .upsert_episode(episode(&id, 1, 1, FileStatus::Found))
            .await;
        library
            .upsert_episode(episode(&id, 1, 2, FileStatus::Missing))
            .await;
        library
            .upsert_episode(episode(&id, 1, 3, FileStatus::NotAired))
            .await;
        let mut ignored = episode(&id, 1, 4, FileStatus::Missing);
        ignored.is_ignored = true;
        library.upsert_episode(ignored).await;

        let summary = library.summary_for_show(&id).await;
        assert_eq!(summary.episodes_found, 1);
        assert_eq!(summary.episodes_missing, 1);
        assert_eq!(summary.episodes_not_aired, 1);
        assert_eq!(summary.episodes_ignored, 1);
    }

    #[tokio::test]
    async fn test_attach_file_keeps_future_episode_not_aired() {
        let library = Library::new();
        let id = library.add_show(show()).await;
        let today = chrono::NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();

        let mut future = episode(&id, 1, 1, FileStatus::NotAired);
        future.air_date = NaiveDate::from_ymd_opt(2026, 8, 31);
        library.upsert_episode(future).await;

        let slot = SlotKey {
            show_id: id.clone(),
            season: 1,
            episode: 1,
        };
        library
            .attach_file(&slot, PathBuf::from("/lib/early-leak.mkv"), None, true, today)
            .await
            .unwrap();

        let episode = library.get_episode(&slot).await.unwrap();
        assert_eq!(episode.status, FileStatus::NotAired);
        assert!(episode.file_path.is_some());

        // Once the date passes, the same call reports the file found.
        library
            .attach_file(
                &slot,
                PathBuf::from("/lib/early-leak.mkv"),
                None,
                true,
                NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
            )
            .await
            .unwrap();
        let episode = library.get_episode(&slot).await.unwrap();
        assert_eq!(episode.status, FileStatus::Renamed);
    }

    #[tokio::test]
    async fn test_missing_not_counted_when_tracking_disabled() {
        let library = Library::new();
        let mut show = show();
        show.do_missing = false;
        let id = library.add_show(show).await;
        library
            .upsert_episode(episode(&id, 1, 1, FileStatus::Missing))
            .await;
        library
            .upsert_episode(episode(&id, 1, 2, FileStatus::Found))
            .await;

        let summary = library.summary_for_show(&id).await;
        assert_eq!(summary.episodes_missing, 0);
        assert_eq!(summary.episodes_found, 1);
    }

    #[tokio::test]
    async fn test_find_show_by_title_is_case_insensitive() {
        let library = Library::new();
        library.add_show(show()).await;
        assert!(library.find_show_by_title("severance").await.is_some());
        assert!(library.find_show_by_title("SEVERANCE").await.is_some());
        assert!(library.find_show_by_title("lost").await.is_none());
    }

    #[tokio::test]
    async fn test_take_pending_is_one_shot() {
        use crate::models::action::Action;
        let library = Library::new();
        let action = Action::place(
            PathBuf::from("/in/a.mkv"),
            PathBuf::from("/lib/a.mkv"),
            SlotKey {
                show_id: "s".to_string(),
                season: 1,
                episode: 1,
            },
        );
        let id = library.insert_action(action).await;

        assert!(library.take_pending(&id).await.is_ok());
        assert!(library.take_pending(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("library.json");

        let library = Library::new();
        let id = library.add_show(show()).await;
        library
            .upsert_episode(episode(&id, 1, 1, FileStatus::Missing))
            .await;
        library.save(&path).await.unwrap();

        let loaded = Library::load(&path).await.unwrap();
        assert_eq!(loaded.shows().await.len(), 1);
        assert_eq!(loaded.episodes_for_show(&id).await.len(), 1);
    }
}
