//! Error types for imgsync
//!
//! These cover failures that stop a whole run. Per-row failures never surface
//! here; the reconciler turns them into a row status instead.

use thiserror::Error;

/// Result type alias for imgsync operations
pub type Result<T> = std::result::Result<T, ImgsyncError>;

/// Run-level error type
#[derive(Error, Debug)]
pub enum ImgsyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Table error: {0}")]
    Table(String),

    #[error("HTTP client error: {0}")]
    Http(String),
}

impl ImgsyncError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a table error
    pub fn table(msg: impl Into<String>) -> Self {
        Self::Table(msg.into())
    }

    /// Create an HTTP client error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }
}
