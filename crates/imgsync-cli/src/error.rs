//! Error types for the imgsync CLI
//!
//! Messages are shown to the user as-is, so each one says what to check next.

use imgsync_common::ImgsyncError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Settings are missing or invalid
    #[error("Configuration error: {0}. Check the command-line flags, IMGSYNC_* environment variables or the config file.")]
    Config(String),

    /// Input table could not be read or the output table written
    #[error("Table error: {0}. Check that the file exists, is a CSV with a header row and is writable.")]
    Table(String),

    /// HTTP client could not be set up
    #[error("Setup failed: {0}")]
    Setup(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check file permissions and disk space.")]
    Io(#[from] std::io::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a table error
    pub fn table(msg: impl Into<String>) -> Self {
        Self::Table(msg.into())
    }

    /// Create a setup error
    pub fn setup(msg: impl Into<String>) -> Self {
        Self::Setup(msg.into())
    }
}

impl From<ImgsyncError> for CliError {
    fn from(err: ImgsyncError) -> Self {
        match err {
            ImgsyncError::Io(e) => Self::Io(e),
            ImgsyncError::Config(msg) => Self::Config(msg),
            ImgsyncError::Table(msg) => Self::Table(msg),
            ImgsyncError::Http(msg) => Self::Setup(msg),
        }
    }
}
