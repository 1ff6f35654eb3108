//! imgsync CLI Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Command-line front end for the image reconciler.
//!
//! # Overview
//!
//! - **Runs**: reconcile a CSV against a bucket (`imgsync run`)
//! - **Configuration**: print the resolved settings (`imgsync config show`)
//! - **Keys**: preview the storage key and public URL of references (`imgsync key`)
//!
//! Settings resolve from command-line flags, then `IMGSYNC_*` environment
//! variables (a `.env` file is loaded first), then an optional TOML file, then
//! built-in defaults.

pub mod commands;
pub mod config;
pub mod error;
pub mod progress;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{builder::BoolishValueParser, Args, Parser, Subcommand};
use std::path::PathBuf;

/// imgsync - reconcile product image references against S3
#[derive(Parser, Debug)]
#[command(name = "imgsync")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML configuration file
    #[arg(long, env = "IMGSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile a CSV of image references against the bucket
    Run {
        #[command(flatten)]
        settings: SettingsArgs,

        /// Skip the confirmation prompt for production runs
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Show the storage key and public URL for image references (no network access)
    Key {
        /// Image reference URLs
        #[arg(required = true)]
        urls: Vec<String>,

        #[command(flatten)]
        settings: SettingsArgs,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show {
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

/// Settings that can come from flags, environment or the config file
///
/// Switches take an optional value (`--dry-run`, `--dry-run=false`); when the
/// `--no-x` form is also given it wins.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Input CSV
    #[arg(long, visible_alias = "input-csv", env = "IMGSYNC_INPUT_CSV")]
    pub input: Option<PathBuf>,

    /// Output CSV (defaults to `<input>_processed.csv`)
    #[arg(long, visible_alias = "output-csv", env = "IMGSYNC_OUTPUT_CSV")]
    pub output: Option<PathBuf>,

    /// Destination bucket
    #[arg(long, visible_alias = "bucket-name", env = "IMGSYNC_BUCKET")]
    pub bucket: Option<String>,

    /// Bucket region
    #[arg(long, visible_alias = "aws-region", env = "IMGSYNC_REGION")]
    pub region: Option<String>,

    /// Custom S3-compatible endpoint (implies path-style addressing)
    #[arg(long, env = "IMGSYNC_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Base URL for public object links, e.g. a CDN in front of the bucket
    #[arg(long, env = "IMGSYNC_PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,

    /// Do not send the public-read ACL with uploads
    #[arg(long, env = "IMGSYNC_NO_PUBLIC_ACL")]
    pub no_public_acl: bool,

    /// Prefix prepended to every storage key
    #[arg(long, env = "IMGSYNC_KEY_PREFIX")]
    pub key_prefix: Option<String>,

    /// Column checked first for the image reference
    #[arg(long, env = "IMGSYNC_REFERENCE_FIELD")]
    pub reference_field: Option<String>,

    /// Target image width in pixels
    #[arg(long, env = "IMGSYNC_TARGET_WIDTH")]
    pub target_width: Option<u32>,

    /// Target image height in pixels
    #[arg(long, env = "IMGSYNC_TARGET_HEIGHT")]
    pub target_height: Option<u32>,

    /// Report what would be uploaded without writing anything
    #[arg(
        long,
        env = "IMGSYNC_DRY_RUN",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub dry_run: Option<bool>,

    /// Perform uploads
    #[arg(long, visible_alias = "upload")]
    pub no_dry_run: bool,

    /// Only process the first rows of the table
    #[arg(
        long,
        env = "IMGSYNC_TEST_MODE",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub test_mode: Option<bool>,

    /// Process the whole table
    #[arg(long)]
    pub no_test_mode: bool,

    /// Number of rows processed in test mode
    #[arg(long, env = "IMGSYNC_TEST_ROWS")]
    pub test_rows: Option<usize>,

    /// Keep a local copy of every transformed image
    #[arg(
        long,
        env = "IMGSYNC_DEBUG_SAVE",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub debug_save: Option<bool>,

    /// Do not keep local copies of transformed images
    #[arg(long)]
    pub no_debug_save: bool,

    /// Directory for local copies of transformed images
    #[arg(long, env = "IMGSYNC_DEBUG_DIR")]
    pub debug_dir: Option<PathBuf>,

    /// Timeout for probes and downloads, in seconds
    #[arg(long, env = "IMGSYNC_HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: Option<u64>,
}

impl SettingsArgs {
    pub fn dry_run(&self) -> Option<bool> {
        switch(self.dry_run, self.no_dry_run)
    }

    pub fn test_mode(&self) -> Option<bool> {
        switch(self.test_mode, self.no_test_mode)
    }

    pub fn debug_save(&self) -> Option<bool> {
        switch(self.debug_save, self.no_debug_save)
    }
}

fn switch(on: Option<bool>, off: bool) -> Option<bool> {
    if off {
        Some(false)
    } else {
        on
    }
}
