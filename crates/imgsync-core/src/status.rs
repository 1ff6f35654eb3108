//! Row outcomes

use crate::key::StorageKey;
use std::fmt;

/// Why an upload is (or would be) performed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadIntent {
    /// No object at the key yet
    New,
    /// An object exists but its public URL did not answer 200
    Reupload { prior_status: Option<u16> },
}

impl UploadIntent {
    pub fn prior_status(&self) -> Option<u16> {
        match self {
            UploadIntent::New => None,
            UploadIntent::Reupload { prior_status } => *prior_status,
        }
    }
}

/// Closed set of per-row statuses; `Display` gives the status column value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    ExistsOk,
    UploadedOk,
    WouldUpload(UploadIntent),
    VerifyFailed(Option<u16>),
    SkippedInvalidUrl,
    Error(String),
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowStatus::ExistsOk => f.write_str("EXISTS_OK"),
            RowStatus::UploadedOk => f.write_str("UPLOADED_OK"),
            RowStatus::WouldUpload(UploadIntent::New) => f.write_str("WOULD_UPLOAD_NOT_EXISTS"),
            RowStatus::WouldUpload(UploadIntent::Reupload {
                prior_status: Some(code),
            }) => write!(f, "WOULD_UPLOAD_EXISTS_{}_REUPLOAD", code),
            RowStatus::WouldUpload(UploadIntent::Reupload { prior_status: None }) => {
                f.write_str("WOULD_UPLOAD_EXISTS_UNREACHABLE_REUPLOAD")
            },
            RowStatus::VerifyFailed(Some(code)) => write!(f, "UPLOADED_VERIFY_FAIL_{}", code),
            RowStatus::VerifyFailed(None) => f.write_str("UPLOADED_VERIFY_FAIL_UNREACHABLE"),
            RowStatus::SkippedInvalidUrl => f.write_str("SKIPPED_INVALID_URL"),
            RowStatus::Error(reason) => write!(f, "ERROR: {}", reason),
        }
    }
}

/// Summary bucket a result is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Accessible,
    NewUpload,
    Reupload,
    Skipped,
    VerifyFailed,
    Error,
}

/// Outcome of reconciling one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowResult {
    /// 1-based position of the row in the input table
    pub row: usize,
    pub storage_key: Option<StorageKey>,
    pub status: RowStatus,
    pub http_response_code: Option<u16>,
    pub public_url: Option<String>,
    pub intent: Option<UploadIntent>,
}

impl RowResult {
    pub fn skipped(row: usize) -> Self {
        Self {
            row,
            storage_key: None,
            status: RowStatus::SkippedInvalidUrl,
            http_response_code: None,
            public_url: None,
            intent: None,
        }
    }

    pub fn error(row: usize, reason: impl Into<String>) -> Self {
        Self {
            row,
            storage_key: None,
            status: RowStatus::Error(reason.into()),
            http_response_code: None,
            public_url: None,
            intent: None,
        }
    }

    pub fn category(&self) -> Category {
        match (&self.status, self.intent) {
            (RowStatus::ExistsOk, _) => Category::Accessible,
            (RowStatus::SkippedInvalidUrl, _) => Category::Skipped,
            (RowStatus::Error(_), _) => Category::Error,
            (RowStatus::VerifyFailed(_), _) => Category::VerifyFailed,
            (RowStatus::WouldUpload(UploadIntent::New), _) => Category::NewUpload,
            (RowStatus::WouldUpload(UploadIntent::Reupload { .. }), _) => Category::Reupload,
            (RowStatus::UploadedOk, Some(UploadIntent::Reupload { .. })) => Category::Reupload,
            (RowStatus::UploadedOk, _) => Category::NewUpload,
        }
    }
}
