//! Progress bar utilities for CLI runs

use imgsync_core::RowResult;
use indicatif::{ProgressBar, ProgressStyle};

const ROW_TEMPLATE: &str =
    "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} rows ({eta})";

/// Create a progress bar counting processed rows
pub fn create_progress_bar(total: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(ROW_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Advance the bar for one finished row and show its status
pub fn record_row(pb: &ProgressBar, result: &RowResult) {
    pb.set_message(format!("row {}: {}", result.row, result.status));
    pb.inc(1);
}
