//! Error types for pack-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] pack_core::Error),

    #[error(transparent)]
    Compile(#[from] pack_script::CompileError),

    #[error(transparent)]
    Script(#[from] pack_script::ScriptFailure),

    #[error(transparent)]
    Fs(#[from] pack_fs::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
