//! Showkeeper CLI
//!
//! A command-line tool that keeps a TV library reconciled with what has
//! aired, driven by TMDB metadata.

use clap::Parser;
use showkeeper::cli::{
    args::{Cli, Commands},
    commands::{actions, log, scan, shows, status, watch},
};
use showkeeper::cli::args::ShowsCommand;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Watch => {
            watch::run().await?;
        }

        Commands::Scan { strategy } => {
            scan::run(strategy).await?;
        }

        Commands::Actions { action } => {
            actions::run(action).await?;
        }

        Commands::Shows { action } => match action {
            ShowsCommand::Add {
                title,
                folder,
                tmdb_id,
            } => {
                shows::add(&title, folder, tmdb_id).await?;
            }
            ShowsCommand::List => {
                shows::list().await?;
            }
            ShowsCommand::Remove { id } => {
                shows::remove(&id).await?;
            }
        },

        Commands::Status => {
            status::run().await?;
        }

        Commands::Log {
            from,
            to,
            offset,
            limit,
            clear,
        } => {
            log::run(from, to, offset, limit, clear).await?;
        }

        Commands::Purge => {
            watch::purge().await?;
        }
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("showkeeper=debug")
    } else {
        EnvFilter::new("showkeeper=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
