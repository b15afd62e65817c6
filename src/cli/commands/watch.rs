//! Watch command implementation.
//!
//! Runs the watcher supervisor in the foreground until Ctrl-C. The
//! event feed here is a polling enumerator over the watch folder; any
//! other source delivering `FileEvent`s over the channel would work
//! the same way.

use super::AppContext;
use crate::core::supervisor::WatcherSupervisor;
use crate::services::events::{event_channel, EventKind, EventSender, FileEvent};
use crate::Result;
use colored::Colorize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

/// Start the watcher and block until interrupted.
pub async fn run() -> Result<()> {
    let ctx = AppContext::load().await?;
    let supervisor = Arc::new(WatcherSupervisor::new(
        Arc::clone(&ctx.library),
        Arc::clone(&ctx.ingestor),
        ctx.config.clone(),
        Arc::clone(&ctx.counters),
    ));

    let (sender, receiver) = event_channel();
    supervisor.start(receiver).await?;

    let Some(watch_folder) = ctx.config.watcher.watch_folder.clone() else {
        return Err(crate::Error::PrerequisitesNotMet(
            "watch folder: not configured".to_string(),
        ));
    };
    let poll_interval = Duration::from_secs(ctx.config.watcher.sample_interval_secs.max(1));
    let feeder = tokio::spawn(poll_folder(watch_folder.clone(), sender, poll_interval));

    let _sweep = supervisor.spawn_purge_sweep(Duration::from_secs(6 * 3600));

    println!(
        "{} Watching {} (Ctrl-C to stop)",
        "▶".green(),
        watch_folder.display()
    );

    tokio::signal::ctrl_c().await?;
    println!();
    println!("Stopping, letting in-flight files settle...");

    feeder.abort();
    supervisor.stop().await?;
    ctx.save().await?;

    let state = supervisor.state().await;
    println!(
        "{} Watcher stopped ({} stabilizing, {} queued at shutdown)",
        "✓".green(),
        state.stabilizing,
        state.queued
    );
    Ok(())
}

/// Purge expired Issues entries once, outside the scheduled sweep.
pub async fn purge() -> Result<()> {
    let ctx = AppContext::load().await?;
    if ctx.config.watcher.issues_retention_days == 0 {
        println!("Issues retention is 0; purging is disabled.");
        return Ok(());
    }
    let supervisor = WatcherSupervisor::new(
        Arc::clone(&ctx.library),
        Arc::clone(&ctx.ingestor),
        ctx.config.clone(),
        Arc::clone(&ctx.counters),
    );
    let removed = supervisor.purge_issues()?;
    println!("{} Purged {} expired Issues entries", "✓".green(), removed);
    Ok(())
}

/// Emit a Created event for every file that appears under the folder.
async fn poll_folder(folder: PathBuf, sender: EventSender, interval: Duration) {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    loop {
        for entry in WalkDir::new(&folder)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path().to_path_buf();
            if !seen.insert(path.clone()) {
                continue;
            }
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if sender
                .send(FileEvent {
                    kind: EventKind::Created,
                    path,
                    size,
                })
                .is_err()
            {
                return;
            }
        }
        tokio::time::sleep(interval).await;
    }
}
