//! Scan command implementation.

use super::AppContext;
use crate::cli::args::ScanCommand;
use crate::core::scanner::{DiscoveryOutcome, ScanOrchestrator, ScanStrategy};
use crate::models::episode::SlotKey;
use crate::{Error, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Run a reconciliation scan with the requested strategy.
pub async fn run(command: ScanCommand) -> Result<()> {
    let ctx = AppContext::load().await?;
    let provider = ctx.provider()?;

    let strategy = match command {
        ScanCommand::Full => ScanStrategy::Full,
        ScanCommand::Quick => ScanStrategy::Quick,
        ScanCommand::Ongoing => ScanStrategy::Ongoing,
        ScanCommand::Selected { show_id, episodes } => {
            ScanStrategy::Selected(parse_slots(&show_id, &episodes)?)
        }
        ScanCommand::Discover => ScanStrategy::Discover,
    };

    let scanner = Arc::new(ScanOrchestrator::new(
        Arc::clone(&ctx.library),
        Arc::clone(&ctx.ingestor),
        provider,
        ctx.config.clone(),
    ));

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {percent}% {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let poller = {
        let scanner = Arc::clone(&scanner);
        let bar = bar.clone();
        tokio::spawn(async move {
            loop {
                let status = scanner.status().await;
                bar.set_position(u64::from(status.progress));
                bar.set_message(status.message.clone());
                if !status.running && status.result.is_some() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        })
    };

    // Ctrl-C stops the scan at the next checkpoint instead of killing
    // the process; enqueued actions survive.
    let canceller = {
        let scanner = Arc::clone(&scanner);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                scanner.cancel();
            }
        })
    };

    let report = scanner.run(strategy).await?;
    poller.abort();
    canceller.abort();
    bar.finish_and_clear();
    ctx.save().await?;

    if report.cancelled {
        println!("{} Scan cancelled", "!".yellow());
    }
    println!(
        "{} Scanned {} shows: {} matched, {} unmatched, {} quality-rejected, {} errors",
        "✓".green(),
        report.shows_scanned,
        report.episodes_matched,
        report.unmatched_files,
        report.quality_rejects,
        report.errors
    );

    for discovered in &report.discovered {
        let line = match &discovered.outcome {
            DiscoveryOutcome::Added(id) => format!("{} {} → {}", "+".green(), discovered.folder, id),
            DiscoveryOutcome::Existing => format!("{} {} (already tracked)", "=".dimmed(), discovered.folder),
            DiscoveryOutcome::NotFound => format!("{} {} (no provider match)", "?".yellow(), discovered.folder),
            DiscoveryOutcome::Error(e) => format!("{} {} ({})", "✗".red(), discovered.folder, e),
        };
        println!("  {}", line);
    }

    let pending = ctx.queue.pending().await;
    if !pending.is_empty() {
        println!();
        println!(
            "{} pending actions await review: {}",
            pending.len(),
            "showkeeper actions list".bold()
        );
    }
    Ok(())
}

/// Parse SxxEyy tokens into slots for one show.
fn parse_slots(show_id: &str, episodes: &[String]) -> Result<Vec<SlotKey>> {
    episodes
        .iter()
        .map(|token| {
            let numbers = crate::core::parser::parse_episode_numbers(std::path::Path::new(
                &format!("{}.mkv", token),
            ))
            .ok_or_else(|| Error::other(format!("unparseable episode token: {}", token)))?;
            Ok(SlotKey {
                show_id: show_id.to_string(),
                season: numbers.season,
                episode: numbers.episode,
            })
        })
        .collect()
}
