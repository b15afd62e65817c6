//! Metadata provider contract.
//!
//! Providers are assumed to fail transiently; failures surface as
//! `Error::MetadataUnavailable` and never corrupt local state.

use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// One episode as reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRecord {
    pub season: u16,
    pub number: u16,
    pub title: String,
    /// None means the air date is unannounced.
    pub air_date: Option<NaiveDate>,
}

/// Full provider snapshot for one show.
#[derive(Debug, Clone, Default)]
pub struct ShowSnapshot {
    pub title: String,
    /// Raw provider status string ("Returning Series", "Ended", ...).
    pub status: Option<String>,
    pub first_air_date: Option<NaiveDate>,
    pub episodes: Vec<EpisodeRecord>,
}

/// A show candidate returned by a search.
#[derive(Debug, Clone)]
pub struct ShowCandidate {
    pub provider_id: u64,
    pub title: String,
    pub first_air_date: Option<NaiveDate>,
    pub overview: Option<String>,
}

/// Abstract metadata provider (TMDB, TVDB).
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch the full episode catalog for a show.
    async fn fetch_show(&self, provider_id: u64) -> Result<ShowSnapshot>;

    /// Search shows by title.
    async fn search_shows(&self, query: &str) -> Result<Vec<ShowCandidate>>;
}
