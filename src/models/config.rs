//! Configuration model.

use crate::models::quality::{CodecPreferences, QualityPriorityList};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Current config schema version.
pub const CONFIG_VERSION: u32 = 1;

/// Application configuration, persisted as a versioned TOML record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for forward migration.
    pub version: u32,
    /// TMDB configuration.
    pub tmdb: TmdbConfig,
    /// Watcher configuration.
    pub watcher: WatcherConfig,
    /// Scan configuration.
    pub scan: ScanConfig,
    /// Library configuration.
    pub library: LibraryConfig,
    /// Quality comparison settings.
    pub quality: QualityConfig,
    /// UTC offset in minutes for the "today" airing cutoff.
    pub timezone_offset_minutes: i32,
    /// Path of the persisted library snapshot.
    pub state_file: PathBuf,
}

/// TMDB configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    /// API key; falls back to the TMDB_API_KEY environment variable.
    pub api_key: Option<String>,
    /// Language for responses.
    pub language: String,
}

/// How files in the Issues folder are organized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssuesOrganization {
    /// Subfolder per detection date (YYYY-MM-DD).
    ByDate,
    /// Subfolder per issue reason string.
    ByReason,
    /// No subfolders.
    Flat,
}

/// What happens to a superseded incumbent file after a better
/// candidate is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupersededPolicy {
    /// Delete the old file.
    Delete,
    /// Quarantine the old file in the Issues folder.
    MoveToIssues,
    /// Leave the old file where it is.
    Leave,
}

/// Watcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Folder watched for incoming downloads.
    pub watch_folder: Option<PathBuf>,
    /// Quarantine folder for unplaceable files.
    pub issues_folder: Option<PathBuf>,
    /// Files below this size are treated as samples and skipped.
    pub min_file_size_bytes: u64,
    /// Seconds between stabilization size samples.
    pub sample_interval_secs: u64,
    /// Approve placement actions immediately instead of leaving them pending.
    pub auto_approve: bool,
    /// Extensions of companion files moved with a placed video.
    pub companion_extensions: Vec<String>,
    /// Issues folder organization scheme.
    pub issues_organization: IssuesOrganization,
    /// Days to keep Issues entries before auto-purge; 0 disables purging.
    pub issues_retention_days: u32,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            watch_folder: None,
            issues_folder: None,
            min_file_size_bytes: 50 * 1024 * 1024,
            sample_interval_secs: 5,
            auto_approve: false,
            companion_extensions: ["srt", "ass", "sub", "idx", "nfo", "jpg", "png"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            issues_organization: IssuesOrganization::ByReason,
            issues_retention_days: 0,
        }
    }
}

/// Scan configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Quick scans only look at episodes aired within this many days.
    pub recency_window_days: u32,
    /// Cap on shows imported per library-folder-discovery run.
    pub discovery_batch_limit: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recency_window_days: 14,
            discovery_batch_limit: Some(20),
        }
    }
}

/// Library configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root folder holding one subfolder per show.
    pub root: Option<PathBuf>,
    /// Delete a source file's parent folder when the move leaves it empty.
    pub delete_empty_folders: bool,
    /// Policy for superseded incumbent files.
    pub superseded_policy: SupersededPolicy,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: None,
            delete_empty_folders: true,
            superseded_policy: SupersededPolicy::MoveToIssues,
        }
    }
}

/// Quality comparison settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Ordered factor priority list.
    pub priority: QualityPriorityList,
    /// Codec preference orders.
    pub codecs: CodecPreferences,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            tmdb: TmdbConfig::default(),
            watcher: WatcherConfig::default(),
            scan: ScanConfig::default(),
            library: LibraryConfig::default(),
            quality: QualityConfig::default(),
            timezone_offset_minutes: 0,
            state_file: dirs_config_path().join("library.json"),
        }
    }
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("TMDB_API_KEY").ok(),
            language: "en-US".to_string(),
        }
    }
}

impl Config {
    /// Current date in the configured timezone.
    pub fn today(&self) -> chrono::NaiveDate {
        let offset = chrono::FixedOffset::east_opt(self.timezone_offset_minutes * 60)
            .unwrap_or_else(|| chrono::FixedOffset::east_opt(0).unwrap());
        chrono::Utc::now().with_timezone(&offset).date_naive()
    }
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("showkeeper")
}

/// Load configuration from file, falling back to defaults.
pub fn load_config() -> Config {
    let config_path = dirs_config_path().join("config.toml");

    if config_path.exists() {
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            match toml::from_str::<Config>(&content) {
                Ok(config) => {
                    if let Err(e) = config.quality.priority.validate() {
                        tracing::warn!("Ignoring config quality priority: {}", e);
                        let mut config = config;
                        config.quality.priority = Default::default();
                        return config;
                    }
                    return config;
                }
                Err(e) => tracing::warn!("Could not parse config, using defaults: {}", e),
            }
        }
    }

    Config::default()
}

/// Persist configuration to the config directory.
pub fn save_config(config: &Config) -> crate::Result<()> {
    let dir = dirs_config_path();
    std::fs::create_dir_all(&dir)?;
    let content = toml::to_string_pretty(config).map_err(|e| crate::Error::other(e.to_string()))?;
    std::fs::write(dir.join("config.toml"), content)?;
    Ok(())
}
