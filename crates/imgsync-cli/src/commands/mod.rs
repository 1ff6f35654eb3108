//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod config;
pub mod key;
pub mod run;
