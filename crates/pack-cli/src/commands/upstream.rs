//! Raw upstream queries

use colored::Colorize;
use pack_core::AppContext;

use crate::error::Result;

/// Run the out-version command
pub async fn run_out_version(ctx: &AppContext, id: &str) -> Result<()> {
    print_raw(&ctx.upstream_version_file(id).await?);
    Ok(())
}

/// Run the out-changelist command
pub async fn run_out_changelist(ctx: &AppContext, id: &str) -> Result<()> {
    print_raw(&ctx.upstream_changelist(id).await?);
    Ok(())
}

/// Run the self-check command
pub async fn run_self_check(ctx: &AppContext) -> Result<bool> {
    let needed = ctx.is_app_update_needed().await?;
    let current = &ctx.config().app_version;
    if needed {
        println!(
            "{} a newer packsync is available (running {current}).",
            "update:".yellow().bold()
        );
    } else {
        println!("{} packsync {current} is current.", "OK".green().bold());
    }
    Ok(needed)
}

fn print_raw(text: &str) {
    if text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }
}
