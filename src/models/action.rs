//! Pending filesystem-mutation actions.

use crate::models::episode::SlotKey;
use crate::models::quality::QualityProfile;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Action status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Approved,
    Rejected,
}

/// Why a file was routed to the Issues folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueReason {
    Unmatched,
    LowerOrEqualQuality,
}

impl IssueReason {
    /// Stable string used for logging and by-reason Issues subfolders.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueReason::Unmatched => "unmatched",
            IssueReason::LowerOrEqualQuality => "lower-or-equal-quality",
        }
    }
}

impl std::fmt::Display for IssueReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an action does when executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ActionKind {
    /// Move a matched file into the library at its formatted path.
    PlaceInLibrary,
    /// Quarantine a file in the Issues folder.
    MoveToIssues { reason: IssueReason },
}

/// A companion file (subtitle, nfo, artwork) that rides along with
/// the main file's move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanionMove {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// A proposed, reviewable filesystem mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    /// Unique action id.
    pub id: String,
    /// What executing this action does.
    pub kind: ActionKind,
    /// Source path of the main file.
    pub source: PathBuf,
    /// Destination path of the main file.
    pub destination: PathBuf,
    /// Episode slot this action concerns, if any.
    pub slot: Option<SlotKey>,
    /// Quality of the source file, stamped on the episode when placed.
    pub quality: Option<QualityProfile>,
    /// Companion files moved with the main file.
    pub companions: Vec<CompanionMove>,
    /// Incumbent file superseded by this placement, if any.
    pub supersedes: Option<PathBuf>,
    /// Current status.
    pub status: ActionStatus,
    /// Creation timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Action {
    /// Create a pending placement action for an episode slot.
    pub fn place(source: PathBuf, destination: PathBuf, slot: SlotKey) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: ActionKind::PlaceInLibrary,
            source,
            destination,
            slot: Some(slot),
            quality: None,
            companions: Vec::new(),
            supersedes: None,
            status: ActionStatus::Pending,
            created_at: chrono::Utc::now(),
        }
    }

    /// Create a pending move-to-issues action.
    pub fn issue(source: PathBuf, destination: PathBuf, reason: IssueReason) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: ActionKind::MoveToIssues { reason },
            source,
            destination,
            slot: None,
            quality: None,
            companions: Vec::new(),
            supersedes: None,
            status: ActionStatus::Pending,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Aggregate result of approving every pending action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveAllResult {
    pub success: usize,
    pub failed: usize,
}
