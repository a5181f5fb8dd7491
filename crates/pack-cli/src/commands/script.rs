//! Offline changelist commands: compile and run a local changelist file

use std::path::{Path, PathBuf};

use colored::Colorize;
use pack_core::AppContext;
use pack_fs::{PathRoots, PathSandbox};
use pack_script::{Changelist, Environment, EventSink, Interpreter, RunReport, find_route};

use crate::error::Result;

/// Directories a local run operates in. Missing roots default from the
/// app context.
#[derive(Debug, Clone)]
pub struct RunTarget {
    pub instance: PathBuf,
    pub install: Option<PathBuf>,
    pub downloads: Option<PathBuf>,
}

fn load_changelist(path: &Path) -> Result<Changelist> {
    let text = pack_fs::io::read_text(path)?;
    Ok(Changelist::parse(&text)?)
}

/// Run the compile command, printing the route and the assembled script.
pub fn run_compile(changelog: &Path, from: &str, to: &str) -> Result<Vec<String>> {
    let changelist = load_changelist(changelog)?;
    let script = changelist.compile(from, to)?;

    if changelist.bucket(from, to).is_some() {
        println!("{} {from} -> {to} (direct)", "Route:".dimmed());
    } else if let Some(route) = find_route(changelist.edges(), from, to) {
        println!("{} {}", "Route:".dimmed(), route.versions().join(" -> "));
    }
    for line in &script {
        println!("{line}");
    }
    println!("{} {} directive line(s).", "Total:".dimmed(), script.len());
    Ok(script)
}

/// Run the run command against explicit directories.
pub async fn run_script(
    ctx: &AppContext,
    changelog: &Path,
    from: &str,
    to: &str,
    target: &RunTarget,
    sink: &dyn EventSink,
) -> Result<RunReport> {
    let changelist = load_changelist(changelog)?;
    let script = changelist.compile(from, to)?;

    let downloads = target
        .downloads
        .clone()
        .unwrap_or_else(|| ctx.session_dir().join("run"));
    tokio::fs::create_dir_all(&downloads).await?;
    let sandbox = PathSandbox::new(PathRoots::new(
        downloads,
        &target.instance,
        target.install.clone().unwrap_or_default(),
        ctx.appdata_dir(),
        ctx.data_dir(),
    ));

    println!(
        "{} Running {} line(s) for {from} -> {to} in {}",
        "=>".blue().bold(),
        script.len(),
        target.instance.display()
    );
    let downloader = ctx.downloader();
    let decompressor = ctx.decompressor();
    let interpreter = Interpreter::new(&sandbox, sink)
        .with_changelist(&changelist)
        .with_downloader(downloader.as_ref())
        .with_decompressor(decompressor.as_ref())
        .with_max_depth(ctx.config().max_import_depth);

    let mut env = Environment::new();
    let report = interpreter.run(script, &mut env).await?;
    println!(
        "{} {} directive(s) executed.",
        "OK".green().bold(),
        report.executed
    );
    Ok(report)
}
