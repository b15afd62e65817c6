//! Episode expectation model.
//!
//! Derives the set of expected episodes for a show from a provider
//! snapshot and merges them into the library. Merging is idempotent:
//! re-running against identical provider data changes nothing, and manual
//! `is_ignored`/`is_special` flags, matched files and quality profiles
//! always survive.

use crate::models::episode::{Episode, FileStatus};
use crate::models::show::{Show, ShowStatus};
use crate::services::provider::ShowSnapshot;
use crate::store::{Library, ReconciliationSummary};
use crate::{Error, Result};
use chrono::NaiveDate;

/// Build episode drafts for a show from a provider snapshot.
///
/// Every (season, episode) the provider reports becomes a draft. An
/// episode whose air date is unannounced or after `today` is `NotAired`;
/// otherwise it starts as `Missing` until a file is matched. Season 0
/// follows the same aired rule (it only displays as specials).
pub fn expected_episodes(show: &Show, snapshot: &ShowSnapshot, today: NaiveDate) -> Result<Vec<Episode>> {
    validate_snapshot(snapshot)?;

    let mut drafts: Vec<Episode> = snapshot
        .episodes
        .iter()
        .map(|record| {
            let aired = record.air_date.map_or(false, |date| date <= today);
            Episode {
                show_id: show.id.clone(),
                season: record.season,
                number: record.number,
                title: record.title.clone(),
                air_date: record.air_date,
                status: if aired {
                    FileStatus::Missing
                } else {
                    FileStatus::NotAired
                },
                file_path: None,
                quality: None,
                is_ignored: false,
                is_special: false,
            }
        })
        .collect();
    drafts.sort_by_key(|e| (e.season, e.number));
    Ok(drafts)
}

/// Merge provider drafts into the library for one show.
///
/// Only status, title and air-date drift are written; existing manual
/// flags, file paths and quality profiles are preserved. The show's
/// airing status is refreshed from the snapshot. Returns the post-merge
/// reconciliation summary.
pub async fn reconcile_show(
    library: &Library,
    show: &Show,
    snapshot: &ShowSnapshot,
    today: NaiveDate,
) -> Result<ReconciliationSummary> {
    let drafts = expected_episodes(show, snapshot, today)?;

    for draft in drafts {
        let slot = draft.slot();
        let merged = match library.get_episode(&slot).await {
            Some(existing) => merge_episode(existing, draft, today),
            None => draft,
        };
        library.upsert_episode(merged).await;
    }

    let status = ShowStatus::from_provider(snapshot.status.as_deref());
    if status != show.status {
        let mut updated = show.clone();
        updated.status = status;
        library.update_show(updated).await?;
    }

    Ok(library.summary_for_show(&show.id).await)
}

/// Merge a fresh draft into an existing episode record.
fn merge_episode(existing: Episode, draft: Episode, today: NaiveDate) -> Episode {
    let mut merged = existing;
    merged.title = draft.title;
    merged.air_date = draft.air_date;

    let aired = merged.is_aired(today);
    merged.status = if !aired && !merged.is_special && !merged.is_ignored {
        // A future air date always wins over file presence.
        FileStatus::NotAired
    } else if merged.has_file() {
        match merged.status {
            FileStatus::Renamed => FileStatus::Renamed,
            _ => FileStatus::Found,
        }
    } else {
        FileStatus::Missing
    };
    merged
}

fn validate_snapshot(snapshot: &ShowSnapshot) -> Result<()> {
    if snapshot.episodes.is_empty() {
        return Err(Error::MetadataUnavailable(
            "provider snapshot contains no episodes".to_string(),
        ));
    }
    Ok(())
}
