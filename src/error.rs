//! Error types for the library engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library engine.
///
/// Decision-level outcomes (an unmatched file, a lower-quality candidate)
/// are not errors; they are terminal states of the ingestion state machine.
/// Only infrastructure failures live here.
#[derive(Error, Debug)]
pub enum Error {
    // Watcher lifecycle errors
    #[error("Watcher prerequisites not met: {0}")]
    PrerequisitesNotMet(String),

    #[error("Watcher is already running")]
    WatcherAlreadyRunning,

    // Metadata provider errors
    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("TMDB API key not configured. Set TMDB_API_KEY environment variable")]
    TmdbApiKeyMissing,

    #[error("TV show not found on provider: {0}")]
    ShowNotFound(String),

    // File system errors
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("File already exists: {0}")]
    FileAlreadyExists(String),

    // Action queue errors
    #[error("Action not found: {0}")]
    ActionNotFound(String),

    #[error("Action execution failed: {0}")]
    ActionExecutionFailed(String),

    // Scan errors
    #[error("A scan is already running")]
    ConcurrentScanRejected,

    // Store errors
    #[error("Show not found: {0}")]
    UnknownShow(String),

    #[error("Episode not found: S{season:02}E{episode:02}")]
    UnknownEpisode { season: u16, episode: u16 },

    #[error("Invalid quality priority list: {0}")]
    InvalidPriorityList(String),

    #[error("Invalid library snapshot: {0}")]
    InvalidSnapshot(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a generic error from a string.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}
