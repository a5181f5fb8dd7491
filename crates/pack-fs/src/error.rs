//! Error types for pack-fs

use std::path::PathBuf;

use crate::sandbox::Root;

/// Result type for pack-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pack-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} config for {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    #[error(transparent)]
    Sandbox(#[from] SandboxError),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Sandbox violations. Every variant fails closed: no path is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SandboxError {
    #[error("{path} is outside of allowed pack-space, access is denied")]
    Escape { path: PathBuf },

    #[error("path variable '{name}' is not defined")]
    UndefinedVariable { name: String },

    #[error("empty path token")]
    EmptyPath,

    /// A removing or overwriting directive named a root directory itself.
    #[error("the {root} root itself cannot be deleted or replaced")]
    RootTarget { root: Root },
}

impl SandboxError {
    pub fn escape(path: impl Into<PathBuf>) -> Self {
        Self::Escape { path: path.into() }
    }
}
