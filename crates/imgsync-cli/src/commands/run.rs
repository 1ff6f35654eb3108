//! `imgsync run` command implementation
//!
//! Loads the input table, reconciles every row against the bucket and writes
//! the augmented table. A production run (uploads on, whole table) asks for
//! confirmation first unless `--yes` was given.

use crate::config::Settings;
use crate::error::{CliError, Result};
use crate::progress::{create_progress_bar, record_row};
use colored::Colorize;
use imgsync_core::{
    batch::run_batch,
    http::build_client,
    reconcile::{Collaborators, Reconciler},
    storage::S3Storage,
    BatchSummary, HttpFetcher, HttpProber, LetterboxTransformer, Table,
};
use std::{
    io::{self, BufRead, Write},
    path::Path,
    sync::Arc,
};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Phrase that must be typed to start a production run
pub const CONFIRMATION_PHRASE: &str = "CONFIRM UPLOAD";

pub async fn run(settings: Settings, yes: bool) -> Result<()> {
    settings.validate()?;

    let run_id = Uuid::new_v4();
    let span = info_span!("run", run_id = %run_id);
    execute(settings, yes).instrument(span).await
}

async fn execute(settings: Settings, yes: bool) -> Result<()> {
    let (Some(input), Some(output)) = (settings.input_csv.as_deref(), settings.output_csv.as_deref())
    else {
        return Err(CliError::config("input and output CSV paths are required"));
    };

    let table = Table::load(input)?;
    let fields = settings.reference_fields();
    match fields.detect(table.headers()) {
        Some(column) => info!(column, rows = table.len(), "Loaded input table"),
        None => warn!(
            expected = ?fields.names(),
            "No image reference column found, every row will be skipped"
        ),
    }

    print_banner(&settings, input, output, table.len());

    if settings.mode.is_production() && !yes {
        let stdin = io::stdin();
        if !confirm_upload(&mut stdin.lock(), &mut io::stdout())? {
            warn!("Production run cancelled at the confirmation prompt");
            println!("{}", "Run cancelled, no rows were processed.".yellow());
            return Ok(());
        }
    }

    let client = build_client(settings.http_timeout())?;
    let storage = S3Storage::new(settings.storage_config()).await?;
    let reconciler = Reconciler::new(
        Collaborators {
            storage: Arc::new(storage),
            prober: Arc::new(HttpProber::new(client.clone())),
            fetcher: Arc::new(HttpFetcher::new(client)),
            transformer: Arc::new(LetterboxTransformer::default()),
        },
        settings.mode.clone(),
    )
    .with_keys(settings.key_deriver())
    .with_reference_fields(fields);

    let total = settings
        .mode
        .row_limit()
        .map_or(table.len(), |limit| limit.min(table.len()));
    info!(
        total,
        dry_run = settings.mode.dry_run,
        test_mode = settings.mode.test_mode,
        "Starting run"
    );

    let pb = create_progress_bar(total as u64, "Reconciling rows");
    let report = run_batch(&reconciler, table.rows().iter().cloned(), |result| {
        record_row(&pb, result);
    })
    .await;
    pb.finish_and_clear();

    table.write_results(output, &report.results)?;
    info!(
        output = %output.display(),
        processed = report.summary.processed,
        errors = report.summary.errors,
        "Run finished"
    );

    print_summary(&report.summary, settings.mode.dry_run, output);
    Ok(())
}

/// Ask for the confirmation phrase; anything else declines
pub fn confirm_upload<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<bool> {
    writeln!(out, "{}", "This run will upload images to the bucket.".yellow().bold())?;
    write!(out, "Type '{}' to continue: ", CONFIRMATION_PHRASE)?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim() == CONFIRMATION_PHRASE)
}

fn print_banner(settings: &Settings, input: &Path, output: &Path, rows: usize) {
    let mode = match (settings.mode.dry_run, settings.mode.test_mode) {
        (true, _) => "DRY RUN".green(),
        (false, true) => "TEST UPLOAD".yellow(),
        (false, false) => "PRODUCTION UPLOAD".red(),
    };

    println!("{} {}", "imgsync".cyan().bold(), mode.bold());
    println!("{:<10} {} ({} rows)", "input:", input.display(), rows);
    println!("{:<10} {}", "output:", output.display());
    println!("{:<10} {} ({})", "bucket:", settings.bucket, settings.region);
    if let Some(limit) = settings.mode.row_limit() {
        println!("{:<10} first {} rows only", "limit:", limit);
    }
    println!();
}

fn print_summary(summary: &BatchSummary, dry_run: bool, output: &Path) {
    let (new_label, reupload_label) = if dry_run {
        ("would upload (new):", "would re-upload:")
    } else {
        ("uploaded (new):", "re-uploaded:")
    };

    println!("{}", "Summary".cyan().bold());
    println!("  {:<22} {}", "processed:", summary.processed);
    println!("  {:<22} {}", "already accessible:", summary.accessible);
    println!("  {:<22} {}", new_label, summary.new_uploads);
    println!("  {:<22} {}", reupload_label, summary.reuploads);
    println!("  {:<22} {}", "skipped:", summary.skipped);
    if summary.verify_failed > 0 {
        println!("  {} {}", format!("{:<22}", "verify failed:").yellow(), summary.verify_failed);
    }
    if summary.errors > 0 {
        println!("  {} {}", format!("{:<22}", "errors:").red(), summary.errors);
    }
    println!();
    println!("{} Results written to {}", "✓".green(), output.display());
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(text: &str) -> bool {
        let mut out = Vec::new();
        confirm_upload(&mut Cursor::new(text.as_bytes()), &mut out).unwrap()
    }

    #[test]
    fn test_confirmation_requires_exact_phrase() {
        assert!(answer("CONFIRM UPLOAD\n"));
        assert!(answer("  CONFIRM UPLOAD  \n"));
        assert!(!answer("confirm upload\n"));
        assert!(!answer("y\n"));
        assert!(!answer(""));
    }

    #[test]
    fn test_confirmation_prompt_names_the_phrase() {
        let mut out = Vec::new();
        confirm_upload(&mut Cursor::new(b"no\n".as_slice()), &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Type 'CONFIRM UPLOAD' to continue"));
    }
}
