//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// packsync - keep modpack instances in step with their upstream changelists
#[derive(Parser, Debug)]
#[command(name = "packsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// App config file (its directory becomes the data directory)
    #[arg(short, long, global = true, env = "PACKSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print events as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Do not print events; they are still logged
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List registered packs
    List {
        /// Include versions and directories
        #[arg(long)]
        verbose: bool,
    },

    /// Show one pack's configuration
    Show {
        /// Pack id
        id: String,
    },

    /// Register a pack config file, or install a pack from a descriptor URL
    ///
    /// Examples:
    ///   packsync add-pack ./skyblock.toml
    ///   packsync add-pack https://example.com/skyblock/pack.toml --instance ~/games/skyblock
    AddPack {
        /// Path to the pack's TOML, JSON or YAML config, or a descriptor URL
        source: String,

        /// Instance directory for a pack installed from a URL ($I)
        #[arg(long)]
        instance: Option<PathBuf>,
    },

    /// Unregister a pack (its config file is kept)
    RemovePack {
        /// Pack id
        id: String,
    },

    /// Check whether a pack has an update
    Check {
        /// Pack id
        id: String,
    },

    /// Check every registered pack
    CheckAll,

    /// Update one pack to its upstream version
    Update {
        /// Pack id
        id: String,
    },

    /// Update every registered pack
    UpdateAll,

    /// Print a pack's upstream versioning file as published
    OutVersion {
        /// Pack id
        id: String,
    },

    /// Print a pack's upstream changelist as published
    OutChangelist {
        /// Pack id
        id: String,
    },

    /// Check whether a newer packsync has been published
    SelfCheck,

    /// Print the script a changelist compiles to
    ///
    /// Examples:
    ///   packsync compile --changelog changes.txt --from 1.0.0 --to 1.2.0
    Compile {
        /// Changelist file
        #[arg(long)]
        changelog: PathBuf,

        /// Installed version
        #[arg(long)]
        from: String,

        /// Target version
        #[arg(long)]
        to: String,
    },

    /// Compile a changelist and run it against an instance directory
    Run {
        /// Changelist file
        #[arg(long)]
        changelog: PathBuf,

        /// Installed version
        #[arg(long)]
        from: String,

        /// Target version
        #[arg(long)]
        to: String,

        /// Instance directory ($I)
        #[arg(long)]
        instance: PathBuf,

        /// Install directory ($G)
        #[arg(long)]
        install: Option<PathBuf>,

        /// Scratch directory for downloads ($D)
        #[arg(long)]
        downloads: Option<PathBuf>,
    },
}
