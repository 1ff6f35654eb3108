//! imgsync CLI - Main entry point

use clap::Parser;
use imgsync_cli::{
    config::{FileConfig, Settings},
    Cli, Commands, ConfigCommand,
};
use imgsync_common::logging::{
    init_logging, log_file_hint, LogConfig, LogLevel, LogOutput, LogRotation,
};
use std::process;
use tracing::{debug, error};

/// Prefix of the per-run log files
const LOG_FILE_PREFIX: &str = "imgsync";

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_config = match log_config(&cli).apply_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: invalid logging configuration: {}", e);
            process::exit(2);
        },
    };

    // The CLI still works when logging cannot be set up
    let _guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {:#}", e);
            None
        },
    };
    if let Some(path) = log_file_hint(&log_config) {
        debug!(path = %path.display(), "Writing log file");
    }

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Runs log to console and a per-run file; other commands only warn on the console
fn log_config(cli: &Cli) -> LogConfig {
    let builder = LogConfig::builder().log_file_prefix(LOG_FILE_PREFIX);
    match (&cli.command, cli.verbose) {
        (Commands::Run { .. }, verbose) => builder
            .level(if verbose { LogLevel::Debug } else { LogLevel::Info })
            .output(LogOutput::Both)
            .rotation(LogRotation::PerRun)
            .build(),
        (_, true) => builder.level(LogLevel::Debug).output(LogOutput::Console).build(),
        (_, false) => builder.level(LogLevel::Warn).output(LogOutput::Console).build(),
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> imgsync_cli::Result<()> {
    let file = FileConfig::load_optional(cli.config.as_deref())?;

    match &cli.command {
        Commands::Run { settings, yes } => {
            imgsync_cli::commands::run::run(Settings::resolve(settings, file), *yes).await
        },

        Commands::Config { command } => match command {
            ConfigCommand::Show { settings } => {
                imgsync_cli::commands::config::show(Settings::resolve(settings, file)).await
            },
        },

        Commands::Key { urls, settings } => {
            imgsync_cli::commands::key::run(urls, Settings::resolve(settings, file)).await
        },
    }
}
