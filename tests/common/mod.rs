//! Shared fixtures for integration tests.

use showkeeper::core::actions::ActionQueue;
use showkeeper::core::ingestion::{Ingestor, WatcherCounters};
use showkeeper::models::config::Config;
use showkeeper::models::episode::{Episode, FileStatus, SlotKey};
use showkeeper::models::show::Show;
use showkeeper::store::Library;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A config whose folders all live under one temp dir, with a small
/// size threshold so tests can use tiny files.
pub fn test_config(root: &Path) -> Config {
    let mut config = Config::default();
    config.watcher.watch_folder = Some(root.join("incoming"));
    config.watcher.issues_folder = Some(root.join("issues"));
    config.watcher.min_file_size_bytes = 1024;
    config.watcher.sample_interval_secs = 1;
    config.watcher.auto_approve = true;
    config.library.root = Some(root.join("library"));
    config.state_file = root.join("library.json");
    std::fs::create_dir_all(root.join("incoming")).unwrap();
    std::fs::create_dir_all(root.join("issues")).unwrap();
    std::fs::create_dir_all(root.join("library")).unwrap();
    config
}

/// A library tracking one show with a handful of aired episodes.
pub async fn seeded_library(config: &Config) -> (Arc<Library>, Show) {
    let library = Arc::new(Library::new());
    let folder = config.library.root.clone().unwrap().join("Severance");
    std::fs::create_dir_all(&folder).unwrap();

    let show = Show::new("Severance", folder);
    library.add_show(show.clone()).await;

    for number in 1..=3 {
        library
            .upsert_episode(Episode {
                show_id: show.id.clone(),
                season: 1,
                number,
                title: format!("Episode {}", number),
                air_date: chrono::NaiveDate::from_ymd_opt(2022, 2, number as u32),
                status: FileStatus::Missing,
                file_path: None,
                quality: None,
                is_ignored: false,
                is_special: false,
            })
            .await;
    }
    (library, show)
}

/// Wire an ingestor and queue around a library, with fast sampling.
pub fn make_ingestor(
    library: Arc<Library>,
    config: &Config,
) -> (Arc<Ingestor>, Arc<ActionQueue>) {
    let queue = Arc::new(ActionQueue::new(Arc::clone(&library), config));
    let counters = Arc::new(WatcherCounters::default());
    let ingestor = Arc::new(
        Ingestor::new(library, Arc::clone(&queue), config.clone(), counters)
            .with_sample_interval(Duration::from_millis(10)),
    );
    (ingestor, queue)
}

/// Write a file of the given size into the watch folder.
pub fn drop_file(config: &Config, name: &str, size: usize) -> std::path::PathBuf {
    let path = config.watcher.watch_folder.clone().unwrap().join(name);
    std::fs::write(&path, vec![0u8; size]).unwrap();
    path
}

pub fn slot(show: &Show, season: u16, episode: u16) -> SlotKey {
    SlotKey {
        show_id: show.id.clone(),
        season,
        episode,
    }
}
