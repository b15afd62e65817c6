//! Log command implementation.

use super::AppContext;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use colored::Colorize;

/// Print a page of watcher log entries, or clear the log.
pub async fn run(
    from: Option<String>,
    to: Option<String>,
    offset: usize,
    limit: usize,
    clear: bool,
) -> Result<()> {
    let ctx = AppContext::load().await?;

    if clear {
        let count = ctx.library.clear_log().await;
        ctx.save().await?;
        println!("{} Cleared {} log entries", "✓".green(), count);
        return Ok(());
    }

    let from = parse_bound(from.as_deref(), false)?;
    let to = parse_bound(to.as_deref(), true)?;

    let page = ctx.library.query_log(from, to, offset, limit).await;
    if page.entries.is_empty() {
        println!("No log entries.");
        return Ok(());
    }

    for entry in &page.entries {
        let tag = match entry.result {
            crate::models::log::LogResult::Ok => "ok".green(),
            crate::models::log::LogResult::Issue => "issue".yellow(),
            crate::models::log::LogResult::Skipped => "skip".dimmed(),
            crate::models::log::LogResult::Error => "error".red(),
        };
        let slot = entry
            .slot
            .as_ref()
            .map(|s| format!(" [{}]", s))
            .unwrap_or_default();
        println!(
            "{} {:<5} {:?}{} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            tag,
            entry.event,
            slot,
            entry.detail
        );
    }
    println!();
    println!(
        "Showing {}-{} of {}",
        offset + 1,
        offset + page.entries.len(),
        page.total
    );
    Ok(())
}

/// Parse a YYYY-MM-DD bound into a UTC instant at the day's start or end.
fn parse_bound(date: Option<&str>, end_of_day: bool) -> Result<Option<DateTime<Utc>>> {
    let Some(date) = date else {
        return Ok(None);
    };
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| Error::other(format!("invalid date: {}", date)))?;
    let time = if end_of_day {
        day.and_hms_opt(23, 59, 59)
    } else {
        day.and_hms_opt(0, 0, 0)
    };
    Ok(time.map(|t| t.and_utc()))
}
