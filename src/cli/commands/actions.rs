//! Actions command implementation.

use super::AppContext;
use crate::cli::args::ActionsCommand;
use crate::models::action::ActionKind;
use crate::Result;
use colored::Colorize;

/// Dispatch an actions subcommand.
pub async fn run(command: ActionsCommand) -> Result<()> {
    let ctx = AppContext::load().await?;

    match command {
        ActionsCommand::List => {
            let pending = ctx.queue.pending().await;
            if pending.is_empty() {
                println!("No pending actions.");
                return Ok(());
            }
            println!(
                "{:<38} {:<10} {}",
                "Id".bold(),
                "Kind".bold(),
                "Move".bold()
            );
            println!("{}", "-".repeat(100));
            for action in pending {
                let kind = match &action.kind {
                    ActionKind::PlaceInLibrary => "place".to_string(),
                    ActionKind::MoveToIssues { reason } => format!("issue:{}", reason),
                };
                println!(
                    "{:<38} {:<10} {} → {}",
                    action.id,
                    kind,
                    action.source.display(),
                    action.destination.display()
                );
            }
        }
        ActionsCommand::Approve { id } => {
            ctx.queue.approve(&id).await?;
            ctx.save().await?;
            println!("{} Action executed", "✓".green());
        }
        ActionsCommand::Reject { id } => {
            ctx.queue.reject(&id).await?;
            ctx.save().await?;
            println!("{} Action rejected (file left in place)", "✓".green());
        }
        ActionsCommand::ApproveAll => {
            let result = ctx.queue.approve_all().await;
            ctx.save().await?;
            if result.failed > 0 {
                println!(
                    "{} {} executed, {} failed (see log)",
                    "!".yellow(),
                    result.success,
                    result.failed
                );
            } else {
                println!("{} {} actions executed", "✓".green(), result.success);
            }
        }
    }
    Ok(())
}
