//! imgsync Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared error handling and logging setup for the imgsync workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`ImgsyncError`] for run-level failures and a matching [`Result`] alias
//! - **Logging**: [`logging::LogConfig`] and [`logging::init_logging`] wire up `tracing`
//!
//! # Example
//!
//! ```no_run
//! use imgsync_common::logging::{init_logging, LogConfig};
//! use tracing::info;
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     info!("imgsync started");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{ImgsyncError, Result};
