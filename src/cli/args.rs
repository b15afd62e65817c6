//! Command line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Showkeeper - keep a TV library reconciled with what has aired
#[derive(Parser, Debug)]
#[command(name = "showkeeper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the download-folder watcher in the foreground
    Watch,

    /// Run a reconciliation scan
    Scan {
        #[command(subcommand)]
        strategy: ScanCommand,
    },

    /// Review and resolve pending actions
    Actions {
        #[command(subcommand)]
        action: ActionsCommand,
    },

    /// Manage tracked shows
    Shows {
        #[command(subcommand)]
        action: ShowsCommand,
    },

    /// Show watcher state and per-show reconciliation summaries
    Status,

    /// Query the watcher log
    Log {
        /// Only entries on or after this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only entries on or before this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Page offset
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Page size
        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Clear the log instead of printing it
        #[arg(long)]
        clear: bool,
    },

    /// Delete Issues-folder entries older than the retention window
    Purge,
}

#[derive(Subcommand, Debug)]
pub enum ScanCommand {
    /// Every show, every expected episode
    Full,

    /// Every show, episodes aired within the recency window
    Quick,

    /// Only shows that can still produce new episodes
    Ongoing,

    /// Explicit episode slots of one show
    Selected {
        /// Show id
        #[arg(value_name = "SHOW_ID")]
        show_id: String,

        /// Episode slots as SxxEyy tokens
        #[arg(value_name = "EPISODE", required = true)]
        episodes: Vec<String>,
    },

    /// Import shows from library subfolder names
    Discover,
}

#[derive(Subcommand, Debug)]
pub enum ActionsCommand {
    /// List pending actions
    List,

    /// Approve and execute one pending action
    Approve {
        /// Action id
        #[arg(value_name = "ACTION_ID")]
        id: String,
    },

    /// Reject one pending action
    Reject {
        /// Action id
        #[arg(value_name = "ACTION_ID")]
        id: String,
    },

    /// Approve every pending action
    ApproveAll,
}

#[derive(Subcommand, Debug)]
pub enum ShowsCommand {
    /// Search the metadata provider and add a show
    Add {
        /// Show title to search for
        #[arg(value_name = "TITLE")]
        title: String,

        /// Library folder for this show (defaults to <library root>/<title>)
        #[arg(short, long, value_name = "FOLDER")]
        folder: Option<PathBuf>,

        /// Use this provider id instead of the first search result
        #[arg(long)]
        tmdb_id: Option<u64>,
    },

    /// List tracked shows
    List,

    /// Stop tracking a show (never deletes files)
    Remove {
        /// Show id
        #[arg(value_name = "SHOW_ID")]
        id: String,
    },
}
