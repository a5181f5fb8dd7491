//! Pack registry commands

use std::path::{Path, PathBuf};

use colored::Colorize;
use pack_core::{AppContext, PackConfig};

use crate::error::Result;

/// Run the list command
pub fn run_list(ctx: &AppContext, verbose: bool) -> Result<()> {
    let packs: Vec<&PackConfig> = ctx.packs().collect();
    if packs.is_empty() {
        println!(
            "No packs registered. Use {} to add one.",
            "packsync add-pack <path|url>".cyan()
        );
        return Ok(());
    }

    println!("{}", "Registered Packs".bold());
    println!();
    for pack in packs {
        let marker = if ctx.config().default_pack.as_deref() == Some(pack.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {:<16} {} ({})",
            pack.id.green(),
            pack.display_name(),
            pack.local_version.dimmed()
        );
        if verbose {
            print_details(pack, "    ");
        }
    }
    Ok(())
}

/// Run the show command
pub fn run_show(ctx: &AppContext, id: &str, json: bool) -> Result<()> {
    let pack = ctx.pack(id)?;
    if json {
        println!("{}", serde_json::to_string_pretty(pack)?);
        return Ok(());
    }
    println!("{} {}", pack.display_name().bold(), format!("[{}]", pack.id).dimmed());
    if !pack.description.is_empty() {
        println!("{}", pack.description);
    }
    print_details(pack, "  ");
    Ok(())
}

/// Run the add-pack command. A `source` with a URL scheme is fetched as a
/// pack descriptor; anything else is a local config file.
pub async fn run_add_pack(ctx: &mut AppContext, source: &str, instance: Option<PathBuf>) -> Result<()> {
    println!("{} Registering {}", "=>".blue().bold(), source);
    let pack = if is_url(source) {
        ctx.add_pack_from_url(source, instance).await?
    } else {
        ctx.add_pack(Path::new(source))?
    };
    println!(
        "{} Pack {} registered at version {}.",
        "OK".green().bold(),
        pack.id.cyan(),
        pack.local_version
    );
    Ok(())
}

/// Run the remove-pack command
pub fn run_remove_pack(ctx: &mut AppContext, id: &str) -> Result<()> {
    let pack = ctx.remove_pack(id)?;
    println!(
        "{} Pack {} removed; {} was left in place.",
        "OK".green().bold(),
        pack.id.cyan(),
        pack.path.display()
    );
    Ok(())
}

fn is_url(source: &str) -> bool {
    source
        .split_once("://")
        .is_some_and(|(scheme, _)| !scheme.is_empty() && scheme.chars().all(|c| c.is_ascii_alphabetic()))
}

fn print_details(pack: &PackConfig, indent: &str) {
    let field = |name: &str, value: String| println!("{indent}{:<10} {value}", name.dimmed());
    field("version", pack.local_version.clone());
    field("branch", pack.local_branch.clone());
    field("instance", pack.instance_dir.display().to_string());
    if let Some(install) = &pack.install_dir {
        field("install", install.display().to_string());
    }
    field("upstream", pack.upstream_version_url.clone());
    field("config", pack.path.display().to_string());
}
