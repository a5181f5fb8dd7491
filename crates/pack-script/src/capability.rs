//! Injected I/O capabilities
//!
//! The interpreter never talks to the network or an archive codec directly.
//! Callers hand it implementations of these traits; retries and transport
//! details live behind them.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Errors from a [`Downloader`].
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("no URL given")]
    NoUrl,

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from a [`Decompressor`].
#[derive(Debug, thiserror::Error)]
pub enum DecompressError {
    #[error("cannot read archive {path}: {message}")]
    Archive { path: PathBuf, message: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fetches remote resources.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download `url` into the file `dest`, creating parent directories.
    async fn download(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;

    /// Fetch `url` as UTF-8 text.
    async fn fetch_text(&self, url: &str) -> Result<String, DownloadError>;
}

/// Extracts archives.
#[async_trait]
pub trait Decompressor: Send + Sync {
    /// Extract every entry of `archive` beneath the directory `dest`.
    async fn extract(&self, archive: &Path, dest: &Path) -> Result<(), DecompressError>;
}
