//! Batch driver
//!
//! Rows are reconciled strictly one after another: the stream awaits each
//! row before pulling the next. In test mode only the first
//! `test_row_limit` rows are processed and the rest are left out of the
//! results entirely. A failing row becomes an `ERROR: <reason>` result and
//! the batch carries on.

use crate::{
    reconcile::Reconciler,
    status::{Category, RowResult},
    table::Row,
};
use futures::{stream, Stream, StreamExt};
use serde::Serialize;
use tracing::{error, info_span, Instrument};

/// Lazily reconcile `rows` in order, one result per processed row
pub fn reconcile_rows<'a, I>(reconciler: &'a Reconciler, rows: I) -> impl Stream<Item = RowResult> + 'a
where
    I: IntoIterator<Item = Row>,
    I::IntoIter: 'a,
{
    let limit = reconciler.mode().row_limit().unwrap_or(usize::MAX);
    stream::iter(rows.into_iter().take(limit)).then(move |row| reconcile_row(reconciler, row))
}

async fn reconcile_row(reconciler: &Reconciler, row: Row) -> RowResult {
    let span = info_span!("row", row = row.index());
    async {
        match reconciler.reconcile(&row).await {
            Ok(result) => result,
            Err(fault) => {
                error!(error = %fault, "Row failed");
                RowResult::error(row.index(), fault.to_string())
            },
        }
    }
    .instrument(span)
    .await
}

/// Counts per outcome, as reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub processed: usize,
    pub accessible: usize,
    pub new_uploads: usize,
    pub reuploads: usize,
    pub skipped: usize,
    pub verify_failed: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn record(&mut self, result: &RowResult) {
        self.processed += 1;
        match result.category() {
            Category::Accessible => self.accessible += 1,
            Category::NewUpload => self.new_uploads += 1,
            Category::Reupload => self.reuploads += 1,
            Category::Skipped => self.skipped += 1,
            Category::VerifyFailed => self.verify_failed += 1,
            Category::Error => self.errors += 1,
        }
    }

    pub fn from_results<'r>(results: impl IntoIterator<Item = &'r RowResult>) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.record(result);
        }
        summary
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<RowResult>,
    pub summary: BatchSummary,
}

/// Drive the whole batch, calling `observe` after every row
pub async fn run_batch<I, F>(reconciler: &Reconciler, rows: I, mut observe: F) -> BatchReport
where
    I: IntoIterator<Item = Row>,
    F: FnMut(&RowResult),
{
    let mut report = BatchReport::default();
    let results = reconcile_rows(reconciler, rows);
    futures::pin_mut!(results);

    while let Some(result) = results.next().await {
        observe(&result);
        report.summary.record(&result);
        report.results.push(result);
    }

    report
}
