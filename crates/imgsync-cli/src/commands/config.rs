//! `imgsync config` command implementation

use crate::config::Settings;
use crate::error::Result;
use colored::Colorize;

/// Show the resolved configuration
pub async fn show(settings: Settings) -> Result<()> {
    println!("{}", "imgsync configuration:".cyan().bold());
    println!();
    println!("{}", settings.to_toml()?);

    let problems = settings.problems();
    if problems.is_empty() {
        println!("{} Ready to run", "✓".green());
    } else {
        println!("{}", "Not ready to run:".yellow());
        for problem in problems {
            println!("  {} {}", "✗".red(), problem);
        }
    }

    println!();
    println!("{}", "Sources, highest first:".cyan());
    println!("  command-line flags");
    println!("  IMGSYNC_* environment variables (a .env file is loaded first)");
    println!("  TOML file given by --config or IMGSYNC_CONFIG");
    println!("  built-in defaults");

    Ok(())
}
