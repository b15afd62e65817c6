//! Show data model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Preferred metadata source for a show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataSource {
    Tmdb,
    Tvdb,
}

/// Airing status as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowStatus {
    Continuing,
    Ended,
    Canceled,
    #[default]
    Unknown,
}

impl ShowStatus {
    /// Whether the show can still produce new episodes.
    pub fn is_ongoing(&self) -> bool {
        !matches!(self, ShowStatus::Ended | ShowStatus::Canceled)
    }

    /// Map a provider status string ("Returning Series", "Ended", ...).
    pub fn from_provider(status: Option<&str>) -> Self {
        match status.map(|s| s.to_lowercase()) {
            Some(s) if s.contains("end") => ShowStatus::Ended,
            Some(s) if s.contains("cancel") => ShowStatus::Canceled,
            Some(s) if s.contains("return") || s.contains("production") => ShowStatus::Continuing,
            _ => ShowStatus::Unknown,
        }
    }
}

/// Naming-format templates for a show's files on disk.
///
/// Placeholders: `{show}`, `{season}`, `{season:02}`, `{episode:02}`,
/// `{title}`, `{resolution}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingFormats {
    /// Season folder name template.
    pub season_folder: String,
    /// Episode filename template (without extension).
    pub episode_filename: String,
}

impl Default for NamingFormats {
    fn default() -> Self {
        Self {
            season_folder: "Season {season:02}".to_string(),
            episode_filename: "{show} - S{season:02}E{episode:02} - {title}".to_string(),
        }
    }
}

/// A tracked TV show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Show {
    /// Local identifier.
    pub id: String,
    /// TMDB id, if known.
    pub tmdb_id: Option<u64>,
    /// TVDB id, if known.
    pub tvdb_id: Option<u64>,
    /// Display title.
    pub title: String,
    /// Airing status.
    pub status: ShowStatus,
    /// Library folder holding this show's files.
    pub folder: PathBuf,
    /// Naming templates.
    pub formats: NamingFormats,
    /// Whether detected files may be renamed/moved into the library.
    pub do_rename: bool,
    /// Whether missing episodes are tracked for this show.
    pub do_missing: bool,
    /// Preferred metadata source.
    pub preferred_source: MetadataSource,
    /// When the show was added.
    pub added_at: chrono::DateTime<chrono::Utc>,
}

impl Show {
    /// Create a show with default policies.
    pub fn new(title: impl Into<String>, folder: PathBuf) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tmdb_id: None,
            tvdb_id: None,
            title: title.into(),
            status: ShowStatus::Unknown,
            folder,
            formats: NamingFormats::default(),
            do_rename: true,
            do_missing: true,
            preferred_source: MetadataSource::Tmdb,
            added_at: chrono::Utc::now(),
        }
    }
}
