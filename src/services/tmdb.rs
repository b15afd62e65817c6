//! TMDB API client.

use crate::services::provider::{EpisodeRecord, MetadataProvider, ShowCandidate, ShowSnapshot};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

/// TMDB client configuration.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    /// API key or Bearer token (JWT)
    pub api_key: String,
    pub language: String,
    /// Whether to use Bearer token authentication (API v4 style)
    pub use_bearer: bool,
}

impl TmdbConfig {
    /// Create config from an explicit key or the environment.
    /// Supports both API key (v3) and Bearer token (v4) formats.
    pub fn new(api_key: Option<String>, language: String) -> Result<Self> {
        let api_key = match api_key {
            Some(key) => key,
            None => std::env::var("TMDB_API_KEY").map_err(|_| Error::TmdbApiKeyMissing)?,
        };

        // Bearer tokens start with "eyJ" (base64 encoded JWT header)
        let use_bearer = api_key.starts_with("eyJ");

        Ok(Self {
            api_key,
            language,
            use_bearer,
        })
    }
}

/// TMDB API client.
pub struct TmdbClient {
    config: TmdbConfig,
    client: reqwest::Client,
}

/// TV show search result.
#[derive(Debug, Deserialize)]
struct TvSearchResult {
    results: Vec<TvSearchItem>,
}

/// TV show search item.
#[derive(Debug, Deserialize)]
struct TvSearchItem {
    id: u64,
    name: String,
    first_air_date: Option<String>,
    overview: Option<String>,
}

/// TV show details.
#[derive(Debug, Deserialize)]
struct TvDetails {
    name: String,
    first_air_date: Option<String>,
    status: Option<String>,
    seasons: Option<Vec<SeasonSummary>>,
}

/// Season summary within show details.
#[derive(Debug, Deserialize)]
struct SeasonSummary {
    season_number: u16,
}

/// Season details.
#[derive(Debug, Deserialize)]
struct SeasonDetails {
    episodes: Vec<EpisodeInfo>,
}

/// Episode info within a season.
#[derive(Debug, Deserialize)]
struct EpisodeInfo {
    name: String,
    episode_number: u16,
    season_number: u16,
    air_date: Option<String>,
}

impl TmdbClient {
    /// Create a new TMDB client.
    pub fn new(config: TmdbConfig) -> Self {
        let client = reqwest::Client::new();
        Self { config, client }
    }

    /// Create a new TMDB client from environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(TmdbConfig::new(None, "en-US".to_string())?))
    }

    /// Build a request with proper authentication.
    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        if self.config.use_bearer {
            request.header("Authorization", format!("Bearer {}", self.config.api_key))
        } else {
            request
        }
    }

    /// Build URL with optional api_key parameter (only for v3 style).
    fn build_url(&self, path: &str, extra_params: &str) -> String {
        if self.config.use_bearer {
            format!(
                "{}/{}?language={}{}",
                TMDB_BASE_URL, path, self.config.language, extra_params
            )
        } else {
            format!(
                "{}/{}?api_key={}&language={}{}",
                TMDB_BASE_URL, path, self.config.api_key, self.config.language, extra_params
            )
        }
    }

    /// Get TV show details.
    async fn get_tv_details(&self, tv_id: u64) -> Result<TvDetails> {
        let url = self.build_url(&format!("tv/{}", tv_id), "");
        let resp = self.build_request(&url).send().await?.json().await?;
        Ok(resp)
    }

    /// Get season details with its episode list.
    async fn get_season_details(&self, tv_id: u64, season_number: u16) -> Result<SeasonDetails> {
        let url = self.build_url(&format!("tv/{}/season/{}", tv_id, season_number), "");
        let resp = self.build_request(&url).send().await?.json().await?;
        Ok(resp)
    }
}

fn parse_date(date: Option<&str>) -> Option<NaiveDate> {
    date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn fetch_show(&self, provider_id: u64) -> Result<ShowSnapshot> {
        let details = self
            .get_tv_details(provider_id)
            .await
            .map_err(|e| Error::MetadataUnavailable(e.to_string()))?;

        let mut episodes = Vec::new();
        for season in details.seasons.unwrap_or_default() {
            let season_details = self
                .get_season_details(provider_id, season.season_number)
                .await
                .map_err(|e| Error::MetadataUnavailable(e.to_string()))?;
            for episode in season_details.episodes {
                episodes.push(EpisodeRecord {
                    season: episode.season_number,
                    number: episode.episode_number,
                    title: episode.name,
                    air_date: parse_date(episode.air_date.as_deref()),
                });
            }
        }

        Ok(ShowSnapshot {
            title: details.name,
            status: details.status,
            first_air_date: parse_date(details.first_air_date.as_deref()),
            episodes,
        })
    }

    async fn search_shows(&self, query: &str) -> Result<Vec<ShowCandidate>> {
        let url = self.build_url(
            "search/tv",
            &format!("&query={}", urlencoding::encode(query)),
        );

        let resp: TvSearchResult = self
            .build_request(&url)
            .send()
            .await
            .map_err(|e| Error::MetadataUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::MetadataUnavailable(e.to_string()))?;

        Ok(resp
            .results
            .into_iter()
            .map(|item| ShowCandidate {
                provider_id: item.id,
                title: item.name,
                first_air_date: parse_date(item.first_air_date.as_deref()),
                overview: item.overview,
            })
            .collect())
    }
}
