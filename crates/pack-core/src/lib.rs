//! Core orchestration for packsync
//!
//! Owns everything above the script layer: version ordering, the pack
//! registry and its on-disk configuration, the concrete download and
//! archive capabilities, and the update workflow that ties a pack's
//! upstream changelist to the interpreter.

pub mod archive;
pub mod config;
pub mod context;
pub mod error;
pub mod transport;
pub mod update;
pub mod version;

pub use archive::ZipDecompressor;
pub use config::{AppConfig, PackConfig, PackDescriptor, RetryPolicy};
pub use context::AppContext;
pub use error::{Error, Result};
pub use transport::HttpDownloader;
pub use update::{PackUpdate, UpdateOutcome, Updater};
pub use version::{Version, VersionOrdering};
