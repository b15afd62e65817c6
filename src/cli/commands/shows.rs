//! Shows command implementation.

use super::AppContext;
use crate::models::show::Show;
use crate::Result;
use colored::Colorize;
use std::path::PathBuf;

/// Search the provider and add a show to the library.
pub async fn add(title: &str, folder: Option<PathBuf>, tmdb_id: Option<u64>) -> Result<()> {
    let ctx = AppContext::load().await?;
    let provider = ctx.provider()?;

    let (provider_id, display_title) = match tmdb_id {
        Some(id) => (id, title.to_string()),
        None => {
            let candidates = provider.search_shows(title).await?;
            let Some(candidate) = candidates.first() else {
                println!("{} no provider match for \"{}\"", "✗".red(), title);
                return Ok(());
            };
            println!(
                "Matched {} ({})",
                candidate.title.bold(),
                candidate
                    .first_air_date
                    .map(|d| d.format("%Y").to_string())
                    .unwrap_or_else(|| "?".to_string())
            );
            (candidate.provider_id, candidate.title.clone())
        }
    };

    if let Some(existing) = ctx.library.find_show_by_title(&display_title).await {
        println!(
            "{} \"{}\" is already tracked (id: {})",
            "✗".red(),
            existing.title,
            existing.id
        );
        return Ok(());
    }

    let folder = match folder {
        Some(folder) => folder,
        None => {
            let Some(root) = ctx.config.library.root.clone() else {
                return Err(crate::Error::PrerequisitesNotMet(
                    "no library root configured and no --folder given".to_string(),
                ));
            };
            root.join(&display_title)
        }
    };

    let snapshot = provider.fetch_show(provider_id).await?;
    let mut show = Show::new(&display_title, folder);
    show.tmdb_id = Some(provider_id);
    let id = ctx.library.add_show(show.clone()).await;

    let summary = crate::core::expectation::reconcile_show(
        &ctx.library,
        &show,
        &snapshot,
        ctx.config.today(),
    )
    .await?;
    ctx.save().await?;

    println!(
        "{} Added {} ({} missing, {} not aired)",
        "✓".green(),
        display_title.bold(),
        summary.episodes_missing,
        summary.episodes_not_aired
    );
    println!("  id: {}", id);
    Ok(())
}

/// List tracked shows with their reconciliation summaries.
pub async fn list() -> Result<()> {
    let ctx = AppContext::load().await?;
    let shows = ctx.library.shows().await;

    if shows.is_empty() {
        println!("No shows tracked.");
        return Ok(());
    }

    println!(
        "{:<38} {:<30} {:<12} {:>6} {:>8}",
        "Id".bold(),
        "Title".bold(),
        "Status".bold(),
        "Found".bold(),
        "Missing".bold()
    );
    println!("{}", "-".repeat(98));

    for show in shows {
        let summary = ctx.library.summary_for_show(&show.id).await;
        println!(
            "{:<38} {:<30} {:<12} {:>6} {:>8}",
            show.id,
            show.title,
            format!("{:?}", show.status).to_lowercase(),
            summary.episodes_found,
            summary.episodes_missing
        );
    }
    Ok(())
}

/// Stop tracking a show. Files on disk are never touched.
pub async fn remove(id: &str) -> Result<()> {
    let ctx = AppContext::load().await?;
    let show = ctx.library.remove_show(id).await?;
    ctx.save().await?;
    println!(
        "{} Removed {} (files in {} were left in place)",
        "✓".green(),
        show.title.bold(),
        show.folder.display()
    );
    Ok(())
}
