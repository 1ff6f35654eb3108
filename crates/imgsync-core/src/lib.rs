//! imgsync Core
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Reconciles a CSV of image references against an S3 bucket: rows whose
//! image is missing or not publicly readable get the source image fetched,
//! letterboxed to a fixed size, uploaded and re-verified.
//!
//! # Overview
//!
//! - [`reference`]: decide whether a row's reference is usable
//! - [`key`]: deterministic storage keys
//! - [`probe`], [`fetch`], [`transform`], [`storage`]: the collaborators, each behind a trait
//! - [`reconcile`]: the per-row state machine
//! - [`batch`]: sequential driver and run summary
//! - [`table`]: CSV in and out
//!
//! # Example
//!
//! ```no_run
//! use imgsync_core::{
//!     batch::run_batch,
//!     http::build_client,
//!     reconcile::{Collaborators, Reconciler},
//!     storage::{S3Storage, StorageConfig},
//!     table::Table,
//!     HttpFetcher, HttpProber, LetterboxTransformer, RunMode,
//! };
//! use std::{path::Path, sync::Arc, time::Duration};
//!
//! # async fn example() -> imgsync_common::Result<()> {
//! let table = Table::load(Path::new("products.csv"))?;
//! let client = build_client(Duration::from_secs(10))?;
//! let storage = S3Storage::new(StorageConfig::for_aws("ap-south-1", "shop-images")).await?;
//!
//! let reconciler = Reconciler::new(
//!     Collaborators {
//!         storage: Arc::new(storage),
//!         prober: Arc::new(HttpProber::new(client.clone())),
//!         fetcher: Arc::new(HttpFetcher::new(client)),
//!         transformer: Arc::new(LetterboxTransformer::default()),
//!     },
//!     RunMode::default(),
//! );
//!
//! let report = run_batch(&reconciler, table.rows().iter().cloned(), |_| {}).await;
//! table.write_results(Path::new("products_out.csv"), &report.results)?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod debug;
pub mod error;
pub mod fetch;
pub mod http;
pub mod key;
pub mod probe;
pub mod reconcile;
pub mod reference;
pub mod status;
pub mod storage;
pub mod table;
pub mod transform;

// Re-export commonly used types
pub use batch::{BatchReport, BatchSummary};
pub use config::RunMode;
pub use error::RowFault;
pub use fetch::{FetchError, HttpFetcher, SourceFetcher};
pub use key::{KeyDeriver, StorageKey};
pub use probe::{HttpProber, ProbeOutcome, Prober};
pub use reconcile::{Collaborators, Reconciler};
pub use status::{RowResult, RowStatus, UploadIntent};
pub use storage::{StorageError, StorageGateway};
pub use table::{Row, Table};
pub use transform::{ImageTransformer, LetterboxTransformer, TransformError};
