//! Error types for pack-script

use std::path::PathBuf;

use crate::capability::{DecompressError, DownloadError};

/// Result type for directive execution
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Failures while turning a changelist into a directive sequence.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error("changelist is empty or malformed: {reason}")]
    EmptyOrMalformedChangelist { reason: String },

    #[error("no route from {from} to {to} in changelist")]
    NoRouteFound { from: String, to: String },
}

impl CompileError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::EmptyOrMalformedChangelist {
            reason: reason.into(),
        }
    }
}

/// Failures while executing a single directive.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("{opcode}: missing argument <{argument}>")]
    MissingArgument {
        opcode: &'static str,
        argument: &'static str,
    },

    #[error("invalid JSON value: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sandbox(#[from] pack_fs::SandboxError),

    #[error(transparent)]
    Fs(#[from] pack_fs::Error),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown label '{0}'")]
    UnknownLabel(String),

    #[error("unknown read flag '{0}'")]
    InvalidReadFlag(char),

    #[error("invalid decompress mode '{0}', expected 'v' or 'f'")]
    InvalidDecompressMode(String),

    #[error("invalid line number '{0}'")]
    InvalidLineNumber(String),

    #[error("line {line} is out of range, file has {total} lines")]
    LineOutOfRange { line: usize, total: usize },

    #[error("splice lists {lines} line numbers but {replacements} replacements")]
    SpliceArity { lines: usize, replacements: usize },

    #[error("invalid regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("decompress failed: {0}")]
    Decompress(#[from] DecompressError),

    #[error("no {0} capability was provided to the interpreter")]
    MissingCapability(&'static str),

    #[error("import needs a changelist but none was provided")]
    NoChangelist,

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("import depth limit of {limit} exceeded")]
    ImportDepthExceeded { limit: usize },

    #[error("in import {from} -> {to}: {source}")]
    SubScript {
        from: String,
        to: String,
        #[source]
        source: Box<ScriptError>,
    },
}

impl ScriptError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The innermost error beneath any `SubScript` wrappers.
    pub fn root_cause(&self) -> &ScriptError {
        match self {
            Self::SubScript { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// The directive that halted a run and why.
#[derive(Debug, thiserror::Error)]
#[error("directive {} `{directive}` failed: {error}", .line + 1)]
pub struct ScriptFailure {
    /// Zero-based index of the failing line within its script.
    pub line: usize,
    /// The raw directive text.
    pub directive: String,
    /// The cause, wrapped once per enclosing import.
    pub error: ScriptError,
}
