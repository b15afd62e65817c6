//! Episode data model.

use crate::models::quality::QualityProfile;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File status of an episode slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// A file is matched to this episode.
    Found,
    /// A file is matched and already renamed to the library format.
    Renamed,
    /// Aired but no file on disk.
    Missing,
    /// Scheduled air date is in the future (or unannounced).
    NotAired,
}

/// Key identifying one episode slot of one show.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub show_id: String,
    pub season: u16,
    pub episode: u16,
}

impl std::fmt::Display for SlotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} S{:02}E{:02}", self.show_id, self.season, self.episode)
    }
}

/// An episode of a tracked show, keyed by (season, episode number).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    /// Owning show id.
    pub show_id: String,
    /// Season number; season 0 holds specials.
    pub season: u16,
    /// Episode number within the season.
    pub number: u16,
    /// Episode title from the provider.
    pub title: String,
    /// Air date; None means unannounced.
    pub air_date: Option<NaiveDate>,
    /// Current file status.
    pub status: FileStatus,
    /// Path of the matched file, if any.
    pub file_path: Option<PathBuf>,
    /// Quality profile of the matched file.
    pub quality: Option<QualityProfile>,
    /// Manually excluded from missing-episode tracking.
    pub is_ignored: bool,
    /// Manually flagged as a special.
    pub is_special: bool,
}

impl Episode {
    /// Slot key for this episode.
    pub fn slot(&self) -> SlotKey {
        SlotKey {
            show_id: self.show_id.clone(),
            season: self.season,
            episode: self.number,
        }
    }

    /// Whether the episode has aired on or before `today`.
    /// An unannounced air date counts as not aired.
    pub fn is_aired(&self, today: NaiveDate) -> bool {
        match self.air_date {
            Some(date) => date <= today,
            None => false,
        }
    }

    /// Whether a file is currently attached to this slot.
    pub fn has_file(&self) -> bool {
        self.file_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(air_date: Option<NaiveDate>) -> Episode {
        Episode {
            show_id: "s1".to_string(),
            season: 1,
            number: 1,
            title: "Pilot".to_string(),
            air_date,
            status: FileStatus::Missing,
            file_path: None,
            quality: None,
            is_ignored: false,
            is_special: false,
        }
    }

    #[test]
    fn test_is_aired() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 30).unwrap();
        assert!(episode(NaiveDate::from_ymd_opt(2026, 8, 30)).is_aired(today));
        assert!(episode(NaiveDate::from_ymd_opt(2020, 1, 1)).is_aired(today));
        assert!(!episode(NaiveDate::from_ymd_opt(2026, 8, 31)).is_aired(today));
        assert!(!episode(None).is_aired(today));
    }
}
