//! packsync CLI
//!
//! Headless front-end for checking and updating modpack instances.

mod cli;
mod commands;
mod error;
mod output;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use pack_core::AppContext;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::RunTarget;
use error::Result;
use output::{ConsoleSink, OutputMode};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mode = OutputMode::from_flags(cli.json, cli.quiet);
    match cli.command {
        Some(cmd) => execute_command(cmd, cli.config.as_deref(), mode).await,
        None => {
            println!("{} modpack update manager", "packsync".green().bold());
            println!();
            println!("Run {} for available commands.", "packsync --help".cyan());
            Ok(())
        }
    }
}

/// `RUST_LOG` decides the level unless `--verbose` forces debug.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let installed = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_ok() {
        tracing::debug!("verbose mode enabled");
    }
}

async fn execute_command(cmd: Commands, config: Option<&Path>, mode: OutputMode) -> Result<()> {
    let sink = ConsoleSink::new(mode);
    let load = || AppContext::load(config);

    match cmd {
        Commands::List { verbose } => commands::run_list(&load()?, verbose),
        Commands::Show { id } => commands::run_show(&load()?, &id, mode == OutputMode::Json),
        Commands::AddPack { source, instance } => {
            commands::run_add_pack(&mut load()?, &source, instance).await
        }
        Commands::RemovePack { id } => commands::run_remove_pack(&mut load()?, &id),
        Commands::Check { id } => commands::run_check(&mut load()?, &id).await.map(drop),
        Commands::CheckAll => commands::run_check_all(&mut load()?).await.map(drop),
        Commands::Update { id } => commands::run_update(&mut load()?, &id, &sink).await,
        Commands::UpdateAll => commands::run_update_all(&mut load()?, Arc::new(sink)).await,
        Commands::OutVersion { id } => commands::run_out_version(&load()?, &id).await,
        Commands::OutChangelist { id } => commands::run_out_changelist(&load()?, &id).await,
        Commands::SelfCheck => commands::run_self_check(&load()?).await.map(drop),
        Commands::Compile {
            changelog,
            from,
            to,
        } => commands::run_compile(&changelog, &from, &to).map(drop),
        Commands::Run {
            changelog,
            from,
            to,
            instance,
            install,
            downloads,
        } => {
            let target = RunTarget {
                instance,
                install,
                downloads,
            };
            commands::run_script(&load()?, &changelog, &from, &to, &target, &sink)
                .await
                .map(drop)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    use pack_test_utils::RecordingSink;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    /// A data dir plus one pack whose upstream files are local paths.
    struct Setup {
        dir: TempDir,
    }

    impl Setup {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        fn path(&self, rel: &str) -> PathBuf {
            self.dir.path().join(rel)
        }

        fn write(&self, rel: &str, content: &str) -> PathBuf {
            let path = self.path(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path
        }

        fn context(&self) -> AppContext {
            AppContext::load(Some(&self.path("data/config.toml"))).unwrap()
        }

        fn pack(&self, local: &str, upstream: &str, changelist: &str) -> PathBuf {
            let version = self.write("upstream/version.txt", &format!("Main\n{upstream}\n"));
            let changes = self.write("upstream/changelist.txt", changelist);
            fs::create_dir_all(self.path("instance")).unwrap();
            self.write(
                "pack.toml",
                &format!(
                    "id = \"demo\"\nname = \"Demo Pack\"\nlocal_version = \"{local}\"\n\
                     upstream_version_url = \"{}\"\nupstream_changelist = \"{}\"\n\
                     instance_dir = \"{}\"\n",
                    version.display(),
                    changes.display(),
                    self.path("instance").display()
                ),
            )
        }
    }

    #[test]
    fn test_list_without_packs() {
        let setup = Setup::new();
        assert!(commands::run_list(&setup.context(), true).is_ok());
    }

    #[tokio::test]
    async fn test_add_show_remove_pack() {
        let setup = Setup::new();
        let pack = setup.pack("1.0.0", "1.0.0", "1.0.0 -> 1.0.0\n");
        let mut ctx = setup.context();

        commands::run_add_pack(&mut ctx, pack.to_str().unwrap(), None)
            .await
            .unwrap();
        assert!(commands::run_list(&ctx, true).is_ok());
        assert!(commands::run_show(&ctx, "demo", false).is_ok());
        assert!(commands::run_show(&ctx, "demo", true).is_ok());

        commands::run_remove_pack(&mut ctx, "demo").unwrap();
        assert!(commands::run_show(&ctx, "demo", false).is_err());
        assert!(pack.exists());
    }

    #[test]
    fn test_cli_error_user() {
        let error = crate::error::CliError::user("test error");
        assert_eq!(format!("{}", error), "test error");
    }

    #[test]
    fn test_compile_routes_through_intermediate() {
        let setup = Setup::new();
        let changelog = setup.write(
            "changes.txt",
            "1.0.0 -> 1.1.0\nlog one\n1.1.0 -> 1.2.0\nlog two\n",
        );
        let script = commands::run_compile(&changelog, "1.0.0", "1.2.0").unwrap();
        assert_eq!(script, vec!["log one", "log two"]);
    }

    #[test]
    fn test_compile_missing_route_is_an_error() {
        let setup = Setup::new();
        let changelog = setup.write("changes.txt", "1.0.0 -> 1.1.0\nlog one\n");
        assert!(matches!(
            commands::run_compile(&changelog, "1.0.0", "9.9.9"),
            Err(crate::error::CliError::Compile(_))
        ));
    }

    #[tokio::test]
    async fn test_run_script_in_instance_dir() {
        let setup = Setup::new();
        let changelog = setup.write(
            "changes.txt",
            "1.0.0 -> 1.1.0\nlog start\nmove $I/a.txt $I/sub/b.txt\n",
        );
        setup.write("instance/a.txt", "hello");
        let target = RunTarget {
            instance: setup.path("instance"),
            install: None,
            downloads: Some(setup.path("scratch")),
        };
        let sink = RecordingSink::new();

        let report = commands::run_script(
            &setup.context(),
            &changelog,
            "1.0.0",
            "1.1.0",
            &target,
            &sink,
        )
        .await
        .unwrap();

        assert_eq!(report.executed, 2);
        assert_eq!(
            fs::read_to_string(setup.path("instance/sub/b.txt")).unwrap(),
            "hello"
        );
    }

    #[tokio::test]
    async fn test_check_and_update_from_local_upstream() {
        let setup = Setup::new();
        let pack = setup.pack("1.0.0", "1.1.0", "1.0.0 -> 1.1.0\nlog updating\n");
        let mut ctx = setup.context();
        ctx.add_pack(&pack).unwrap();

        assert!(commands::run_check(&mut ctx, "demo").await.unwrap());
        assert_eq!(commands::run_check_all(&mut ctx).await.unwrap(), 1);

        let sink = RecordingSink::new();
        commands::run_update(&mut ctx, "demo", &sink).await.unwrap();
        assert_eq!(ctx.pack("demo").unwrap().local_version, "1.1.0");
        assert!(!commands::run_check(&mut ctx, "demo").await.unwrap());
    }

    #[tokio::test]
    async fn test_add_pack_from_file_url_then_out_commands() {
        let setup = Setup::new();
        setup.pack("1.0.0", "1.1.0", "0.0.0 -> 1.1.0\nlog fresh\n");
        let descriptor = setup.write(
            "upstream/pack.toml",
            &format!(
                "id = \"remote\"\nupstream_version_url = \"{}\"\nupstream_changelist = \"{}\"\n",
                setup.path("upstream/version.txt").display(),
                setup.path("upstream/changelist.txt").display()
            ),
        );
        let mut ctx = setup.context();

        let url = format!("file://{}", descriptor.display());
        commands::run_add_pack(&mut ctx, &url, Some(setup.path("remote")))
            .await
            .unwrap();
        assert_eq!(ctx.pack("remote").unwrap().local_version, "0.0.0");
        assert!(setup.path("data/packs/remote.toml").exists());

        commands::run_out_version(&ctx, "remote").await.unwrap();
        commands::run_out_changelist(&ctx, "remote").await.unwrap();
        assert!(commands::run_out_version(&ctx, "ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_self_check_against_local_version_file() {
        let setup = Setup::new();
        let latest = setup.write("upstream/packsync-version", "999.0.0\n");
        let mut ctx = setup.context();
        assert!(commands::run_self_check(&ctx).await.is_err());

        ctx.config_mut().app_version_url = Some(latest.display().to_string());
        assert!(commands::run_self_check(&ctx).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_all_reports_failures() {
        let setup = Setup::new();
        let pack = setup.pack("1.0.0", "1.1.0", "1.0.0 -> 1.1.0\nbogus directive\n");
        let mut ctx = setup.context();
        ctx.add_pack(&pack).unwrap();

        let result = commands::run_update_all(&mut ctx, Arc::new(RecordingSink::new())).await;
        assert!(matches!(result, Err(crate::error::CliError::User { .. })));
        assert_eq!(ctx.pack("demo").unwrap().local_version, "1.0.0");
    }
}
