//! Error types for pack-core

use std::path::PathBuf;

use pack_script::{CompileError, DownloadError, ScriptFailure};

/// Result type for pack-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pack-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// String does not match `major.minor.patch[-flagN]`
    #[error("Invalid version string: '{input}'")]
    VersionParse { input: String },

    #[error("Pack not found: {id}")]
    PackNotFound { id: String },

    /// Ids name the pack's scratch directory, so they must be one plain path component
    #[error("Invalid pack id '{id}': must be a single file name, not '.', '..' or a path")]
    InvalidPackId { id: String },

    #[error("Invalid pack descriptor from {source_url}: {message}")]
    Descriptor { source_url: String, message: String },

    #[error("Pack '{id}' has no instance directory; pass one when installing it")]
    MissingInstanceDir { id: String },

    #[error("No upstream version file is configured for packsync (app_version_url)")]
    NoAppVersionUrl,

    #[error("Pack '{id}' is already registered from {path}")]
    DuplicatePack { id: String, path: PathBuf },

    /// The upstream versioning file has no entry for the pack's branch
    #[error("No version found upstream for branch \"{branch}\" of pack '{id}', config may be malformed")]
    BranchNotFound { id: String, branch: String },

    #[error("Could not determine a data directory for packsync")]
    NoDataDir,

    #[error("HTTP client error: {message}")]
    Client { message: String },

    #[error("Background task failed: {message}")]
    Task { message: String },

    // Transparent wrappers for underlying crate errors
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Script(#[from] ScriptFailure),

    #[error(transparent)]
    Fs(#[from] pack_fs::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
