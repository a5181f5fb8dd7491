//! Update checks and updates against upstream

use std::sync::Arc;

use colored::Colorize;
use pack_core::{AppContext, UpdateOutcome};
use pack_script::EventSink;

use crate::error::{CliError, Result};

/// Run the check command
pub async fn run_check(ctx: &mut AppContext, id: &str) -> Result<bool> {
    let needed = ctx.check_pack(id).await?;
    print_check(ctx, id, needed)?;
    Ok(needed)
}

/// Run the check-all command. A pack that cannot be checked is reported
/// and skipped.
pub async fn run_check_all(ctx: &mut AppContext) -> Result<usize> {
    let ids: Vec<String> = ctx.packs().map(|pack| pack.id.clone()).collect();
    let mut outdated = 0;
    for id in ids {
        match ctx.check_pack(&id).await {
            Ok(needed) => {
                outdated += usize::from(needed);
                print_check(ctx, &id, needed)?;
            }
            Err(error) => {
                eprintln!("{} {}: {}", "warning:".yellow().bold(), id, error);
            }
        }
    }
    println!("{} {outdated} pack(s) can be updated.", "Total:".dimmed());
    Ok(outdated)
}

/// Run the update command
pub async fn run_update(ctx: &mut AppContext, id: &str, sink: &dyn EventSink) -> Result<()> {
    println!("{} Updating {}", "=>".blue().bold(), id.cyan());
    let outcome = ctx.update_pack(id, sink).await?;
    print_outcome(id, &outcome);
    Ok(())
}

/// Run the update-all command
pub async fn run_update_all(ctx: &mut AppContext, sink: Arc<dyn EventSink>) -> Result<()> {
    println!(
        "{} Updating all packs ({} at a time)",
        "=>".blue().bold(),
        ctx.config().max_workers
    );
    let results = ctx.update_all(sink).await;

    let mut failed = Vec::new();
    for (id, result) in results {
        match result {
            Ok(outcome) => print_outcome(&id, &outcome),
            Err(error) => {
                eprintln!("{} {}: {}", "FAILED".red().bold(), id, error);
                failed.push(id);
            }
        }
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(CliError::user(format!("update failed for: {}", failed.join(", "))))
    }
}

fn print_check(ctx: &AppContext, id: &str, needed: bool) -> Result<()> {
    let pack = ctx.pack(id)?;
    let upstream = pack.upstream_version.as_deref().unwrap_or("?");
    if needed {
        println!(
            "{:<16} {} -> {}",
            id.yellow(),
            pack.local_version,
            upstream.green()
        );
    } else {
        println!("{:<16} {} {}", id.green(), pack.local_version, "(up to date)".dimmed());
    }
    Ok(())
}

fn print_outcome(id: &str, outcome: &UpdateOutcome) {
    match outcome {
        UpdateOutcome::UpToDate { version } => {
            println!("{} {} is up to date at {version}.", "OK".green().bold(), id.cyan())
        }
        UpdateOutcome::EmptyChangelist => println!(
            "{} {} published an empty changelist; nothing to do.",
            "warning:".yellow().bold(),
            id
        ),
        UpdateOutcome::Updated { from, to, report } => println!(
            "{} {} updated {from} -> {to} ({} directives, {} imports).",
            "OK".green().bold(),
            id.cyan(),
            report.executed,
            report.imports
        ),
    }
}
