//! Watcher log entries.

use crate::models::episode::SlotKey;
use serde::{Deserialize, Serialize};

/// Kind of ingestion event being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatcherEvent {
    Detected,
    Matched,
    MovedToLibrary,
    MovedToIssues,
    Skipped,
    Error,
    Started,
    Stopped,
}

/// Result tag for a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogResult {
    Ok,
    Issue,
    Skipped,
    Error,
}

/// Immutable append-only record of an ingestion event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherLogEntry {
    pub id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub event: WatcherEvent,
    /// Episode slot the event refers to, if any.
    pub slot: Option<SlotKey>,
    /// Free-text detail.
    pub detail: String,
    pub result: LogResult,
}

impl WatcherLogEntry {
    /// Create an entry timestamped now.
    pub fn new(event: WatcherEvent, result: LogResult, detail: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now(),
            event,
            slot: None,
            detail: detail.into(),
            result,
        }
    }

    /// Attach an episode slot reference.
    pub fn with_slot(mut self, slot: SlotKey) -> Self {
        self.slot = Some(slot);
        self
    }
}
