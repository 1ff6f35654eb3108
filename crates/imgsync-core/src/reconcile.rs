//! Row reconciliation
//!
//! Per row: validate the reference, derive the key, check the bucket (under
//! the normalized key, then any legacy spelling of it) and probe the public URL of an existing object, then either stop (`EXISTS_OK`),
//! report what would happen (dry run), or fetch, transform, upload and
//! verify.
//!
//! ```text
//! VALIDATING ──invalid──────────────────────────────► SKIPPED_INVALID_URL
//!     │
//! PROBING_EXISTING ──exists + 200───────────────────► EXISTS_OK
//!     │ absent / exists + non-200
//! UPLOADING ──dry run───────────────────────────────► WOULD_UPLOAD_*
//!     │ fetch, transform, put
//! VERIFYING ──200──► UPLOADED_OK    otherwise ──────► UPLOADED_VERIFY_FAIL_*
//! ```
//!
//! Any fault along the way comes back as a [`RowFault`].

use crate::{
    config::RunMode,
    debug::DebugImageWriter,
    error::RowFault,
    fetch::SourceFetcher,
    key::{KeyDeriver, KeyError, StorageKey},
    probe::{ProbeOutcome, Prober},
    reference::{self, Reference, ReferenceFields},
    status::{RowResult, RowStatus, UploadIntent},
    storage::StorageGateway,
    table::Row,
    transform::{ImageTransformer, TransformError},
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// The external collaborators a reconciler drives
#[derive(Clone)]
pub struct Collaborators {
    pub storage: Arc<dyn StorageGateway>,
    pub prober: Arc<dyn Prober>,
    pub fetcher: Arc<dyn SourceFetcher>,
    pub transformer: Arc<dyn ImageTransformer>,
}

/// State of the key before any write
enum Existing {
    Absent,
    Accessible(u16),
    Inaccessible(ProbeOutcome),
}

pub struct Reconciler {
    collaborators: Collaborators,
    mode: RunMode,
    keys: KeyDeriver,
    fields: ReferenceFields,
    debug_images: Option<DebugImageWriter>,
}

impl Reconciler {
    pub fn new(collaborators: Collaborators, mode: RunMode) -> Self {
        let debug_images = mode
            .debug_save
            .then(|| DebugImageWriter::new(mode.debug_dir.clone()));
        Self {
            collaborators,
            mode,
            keys: KeyDeriver::default(),
            fields: ReferenceFields::default(),
            debug_images,
        }
    }

    pub fn with_keys(mut self, keys: KeyDeriver) -> Self {
        self.keys = keys;
        self
    }

    pub fn with_reference_fields(mut self, fields: ReferenceFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn mode(&self) -> &RunMode {
        &self.mode
    }

    pub fn reference_fields(&self) -> &ReferenceFields {
        &self.fields
    }

    pub async fn reconcile(&self, row: &Row) -> Result<RowResult, RowFault> {
        let index = row.index();

        let url = match reference::validate(self.fields.pick(row).map(|(_, value)| value)) {
            Reference::Valid(url) => url,
            Reference::Invalid(reason) => {
                info!(%reason, "Skipping row");
                return Ok(RowResult::skipped(index));
            },
        };

        let candidates = self.keys.candidates(&url)?;
        debug!(%url, candidates = candidates.len(), "Derived storage keys");

        let (key, existing) = self.check_existing(&url, &candidates).await?;
        let public_url = self.collaborators.storage.public_url(&key);

        let intent = match existing {
            Existing::Accessible(code) => {
                info!(%key, "Exists and is publicly accessible");
                return Ok(RowResult {
                    row: index,
                    storage_key: Some(key),
                    status: RowStatus::ExistsOk,
                    http_response_code: Some(code),
                    public_url: Some(public_url),
                    intent: None,
                });
            },
            Existing::Absent => UploadIntent::New,
            Existing::Inaccessible(outcome) => UploadIntent::Reupload {
                prior_status: outcome.http_status,
            },
        };

        if self.mode.dry_run {
            let status = RowStatus::WouldUpload(intent);
            info!(%key, %status, "Dry run, nothing written");
            return Ok(RowResult {
                row: index,
                storage_key: Some(key),
                status,
                http_response_code: intent.prior_status(),
                public_url: Some(public_url),
                intent: Some(intent),
            });
        }

        let source = self.collaborators.fetcher.fetch(&url).await?;
        let bytes = self.transform(source).await?;
        self.save_debug_image(&key, &bytes).await;
        let upload = self.collaborators.storage.put(&key, bytes).await?;
        debug!(%key, size = upload.size, checksum = %upload.checksum, "Uploaded");

        let verify = self.collaborators.prober.probe(&public_url).await;
        let status = if verify.is_accessible() {
            RowStatus::UploadedOk
        } else {
            RowStatus::VerifyFailed(verify.http_status)
        };

        if verify.is_accessible() {
            info!(%key, "Uploaded and verified");
        } else {
            warn!(%key, %status, "Uploaded but public URL is not accessible");
        }

        Ok(RowResult {
            row: index,
            storage_key: Some(key),
            status,
            http_response_code: verify.http_status,
            public_url: Some(public_url),
            intent: Some(intent),
        })
    }

    /// Look the row up under each candidate key in turn; the first object
    /// found decides the key the row is probed and written under
    async fn check_existing(
        &self,
        url: &Url,
        candidates: &[StorageKey],
    ) -> Result<(StorageKey, Existing), RowFault> {
        let Some(primary) = candidates.first() else {
            return Err(KeyError::NoPath(url.to_string()).into());
        };

        for key in candidates {
            if !self.collaborators.storage.exists(key).await? {
                continue;
            }
            if key != primary {
                info!(%key, normalized = %primary, "Found under a legacy key");
            }

            let public_url = self.collaborators.storage.public_url(key);
            let outcome = self.collaborators.prober.probe(&public_url).await;
            if outcome.is_accessible() {
                return Ok((key.clone(), Existing::Accessible(200)));
            }

            match outcome.http_status {
                Some(403) => warn!(%key, "Exists but access is forbidden, needs re-upload"),
                Some(code) => warn!(%key, status = code, "Exists but is not accessible, needs re-upload"),
                None => warn!(%key, "Exists but the probe got no response, needs re-upload"),
            }
            return Ok((key.clone(), Existing::Inaccessible(outcome)));
        }

        info!(key = %primary, "Not in bucket, needs upload");
        Ok((primary.clone(), Existing::Absent))
    }

    /// Decode and re-encode off the async worker threads
    async fn transform(&self, source: Vec<u8>) -> Result<Vec<u8>, TransformError> {
        let transformer = Arc::clone(&self.collaborators.transformer);
        let (width, height) = (self.mode.target_width, self.mode.target_height);

        tokio::task::spawn_blocking(move || transformer.transform(&source, width, height))
            .await
            .map_err(|e| TransformError::Aborted(e.to_string()))?
    }

    async fn save_debug_image(&self, key: &StorageKey, bytes: &[u8]) {
        let Some(writer) = &self.debug_images else {
            return;
        };
        match writer.save(key, bytes).await {
            Ok(path) => debug!(path = %path.display(), "Saved debug image"),
            Err(e) => warn!(%key, dir = %writer.dir().display(), error = %e, "Failed to save debug image"),
        }
    }
}
