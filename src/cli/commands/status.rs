//! Status command implementation.

use super::AppContext;
use crate::core::supervisor::check_prerequisites;
use crate::Result;
use colored::Colorize;

/// Print watcher prerequisites, per-show reconciliation summaries and
/// queue depth.
pub async fn run() -> Result<()> {
    let ctx = AppContext::load().await?;

    println!("{}", "Watcher prerequisites".bold().cyan());
    for check in check_prerequisites(&ctx.config) {
        let mark = if check.ok {
            "✓".green()
        } else {
            "✗".red()
        };
        println!("  {} {:<14} {}", mark, check.name, check.detail);
    }

    println!();
    println!("{}", "Library".bold().cyan());
    let shows = ctx.library.shows().await;
    if shows.is_empty() {
        println!("  no shows tracked");
    }
    for show in &shows {
        let summary = ctx.library.summary_for_show(&show.id).await;
        println!(
            "  {:<30} {} found, {} missing, {} not aired, {} special, {} ignored",
            show.title,
            summary.episodes_found.to_string().green(),
            if summary.episodes_missing > 0 {
                summary.episodes_missing.to_string().red()
            } else {
                "0".normal()
            },
            summary.episodes_not_aired,
            summary.episodes_special,
            summary.episodes_ignored
        );
    }

    let pending = ctx.queue.pending().await;
    println!();
    println!("{} {}", "Pending actions:".bold(), pending.len());

    Ok(())
}
