//! Build automation tasks for imgsync
//!
//! Currently generates the CLI reference from the clap definitions.

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for imgsync", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<imgsync_cli::Cli>();

    let content = format!(
        r#"# imgsync CLI Reference

Generated from the CLI source code on {}.

## Overview

`imgsync` reads a CSV of product image references, checks each image in an
S3 bucket, and uploads a letterboxed JPEG for every image that is missing or
not publicly readable. The input table is written back with the storage key,
a processing status, the HTTP code of the last probe and the public URL.

Runs are dry by default: nothing is written to the bucket until uploads are
turned on with `--upload` (or `--no-dry-run`).

## Quick Start

```bash
# See what would happen
imgsync run --input products.csv --bucket shop-images

# Try uploads on the first 5 rows
imgsync run --input products.csv --bucket shop-images --upload --test-mode

# Full run (asks for CONFIRM UPLOAD unless --yes is given)
imgsync run --input products.csv --bucket shop-images --upload

# Preview keys without network access
imgsync key https://shop.example.com/wp-content/uploads/2024/05/mug.png --bucket shop-images
```

## Commands

{}

## Environment Variables

Every `run` flag has an `IMGSYNC_*` counterpart (for example `IMGSYNC_BUCKET`,
`IMGSYNC_DRY_RUN`), and a `.env` file in the working directory is loaded first.

- `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` - storage credentials; the default AWS provider chain is used otherwise
- `LOG_LEVEL`, `LOG_OUTPUT`, `LOG_FORMAT`, `LOG_DIR`, `LOG_ROTATION`, `LOG_FILTER` - logging

## Configuration File

`--config imgsync.toml` (or `IMGSYNC_CONFIG`) supplies defaults below flags and
environment variables:

```toml
bucket = "shop-images"
region = "ap-south-1"
key_prefix = "products"
target_width = 1200
target_height = 800
test_rows = 5
```

---

*This documentation is generated from the CLI source code. To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("✅ Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
