//! Command implementations.

pub mod actions;
pub mod log;
pub mod scan;
pub mod shows;
pub mod status;
pub mod watch;

use crate::core::actions::ActionQueue;
use crate::core::ingestion::{Ingestor, WatcherCounters};
use crate::models::config::{load_config, Config};
use crate::services::provider::MetadataProvider;
use crate::services::tmdb::{TmdbClient, TmdbConfig};
use crate::store::Library;
use crate::Result;
use std::sync::Arc;

/// Shared wiring for every command: configuration, the persisted
/// library and the action pipeline built on top of it.
pub struct AppContext {
    pub config: Config,
    pub library: Arc<Library>,
    pub queue: Arc<ActionQueue>,
    pub ingestor: Arc<Ingestor>,
    pub counters: Arc<WatcherCounters>,
}

impl AppContext {
    /// Load configuration and the library snapshot, then wire the
    /// queue and ingestor around them.
    pub async fn load() -> Result<Self> {
        let config = load_config();
        let library = Arc::new(Library::load_or_default(&config.state_file).await?);
        let queue = Arc::new(ActionQueue::new(Arc::clone(&library), &config));
        let counters = Arc::new(WatcherCounters::default());
        let ingestor = Arc::new(Ingestor::new(
            Arc::clone(&library),
            Arc::clone(&queue),
            config.clone(),
            Arc::clone(&counters),
        ));
        Ok(Self {
            config,
            library,
            queue,
            ingestor,
            counters,
        })
    }

    /// Build the TMDB-backed metadata provider from configuration.
    pub fn provider(&self) -> Result<Arc<dyn MetadataProvider>> {
        let tmdb = TmdbConfig::new(
            self.config.tmdb.api_key.clone(),
            self.config.tmdb.language.clone(),
        )?;
        Ok(Arc::new(TmdbClient::new(tmdb)))
    }

    /// Persist the library snapshot.
    pub async fn save(&self) -> Result<()> {
        self.library.save(&self.config.state_file).await
    }
}
