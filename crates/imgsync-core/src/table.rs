//! CSV table input and output
//!
//! Input is read as UTF-8 and falls back to Windows-1252 (a superset of
//! Latin-1) when the bytes are not valid UTF-8. Output is always UTF-8 and
//! carries the input columns plus the result columns.

use crate::status::RowResult;
use csv::{ReaderBuilder, WriterBuilder};
use encoding_rs::WINDOWS_1252;
use imgsync_common::{ImgsyncError, Result};
use std::{path::Path, sync::Arc};
use tracing::{debug, warn};

// ============================================================================
// Result columns
// ============================================================================

pub const KEY_COLUMN: &str = "S3_Key";
pub const STATUS_COLUMN: &str = "Processing_Status";
pub const HTTP_CODE_COLUMN: &str = "HTTP_Response_Code";
/// Receives the public URL when the input already has it
pub const NEW_IMAGE_COLUMN: &str = "NEW IMAGE";
/// Receives the public URL otherwise
pub const S3_URL_COLUMN: &str = "S3_URL";

/// One input record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    index: usize,
    headers: Arc<Vec<String>>,
    values: Vec<String>,
}

impl Row {
    pub fn new(index: usize, headers: Arc<Vec<String>>, values: Vec<String>) -> Self {
        Self {
            index,
            headers,
            values,
        }
    }

    /// 1-based position in the input table
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Value of a column; short records read as empty
    pub fn get(&self, column: &str) -> Option<&str> {
        self.field(column).map(|(_, value)| value)
    }

    /// Column name and value, if the table has the column
    pub fn field(&self, column: &str) -> Option<(&str, &str)> {
        let position = self.headers.iter().position(|h| h == column)?;
        let value = self.values.get(position).map(String::as_str).unwrap_or("");
        Some((self.headers[position].as_str(), value))
    }
}

/// Encoding the input was decoded with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Windows1252,
}

impl std::fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceEncoding::Utf8 => write!(f, "utf-8"),
            SourceEncoding::Windows1252 => write!(f, "windows-1252"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    headers: Arc<Vec<String>>,
    rows: Vec<Row>,
    encoding: SourceEncoding,
}

impl Table {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| {
            ImgsyncError::table(format!("failed to read {}: {}", path.display(), e))
        })?;
        let table = Self::from_bytes(&bytes)?;
        debug!(
            path = %path.display(),
            rows = table.rows.len(),
            encoding = %table.encoding,
            "Loaded table"
        );
        Ok(table)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let (text, encoding) = match std::str::from_utf8(bytes) {
            Ok(text) => (text.to_string(), SourceEncoding::Utf8),
            Err(_) => {
                warn!("Input is not valid UTF-8, decoding as windows-1252");
                let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
                (text.into_owned(), SourceEncoding::Windows1252)
            },
        };

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ImgsyncError::table(format!("failed to read CSV headers: {}", e)))?
            .iter()
            .map(String::from)
            .collect();

        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(ImgsyncError::table("CSV has no header row"));
        }

        let headers = Arc::new(headers);
        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| {
                ImgsyncError::table(format!("failed to parse CSV row {}: {}", i + 1, e))
            })?;
            rows.push(Row::new(
                i + 1,
                Arc::clone(&headers),
                record.iter().map(String::from).collect(),
            ));
        }

        Ok(Self {
            headers,
            rows,
            encoding,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn encoding(&self) -> SourceEncoding {
        self.encoding
    }

    /// Column that receives the public URL
    pub fn url_column(&self) -> &'static str {
        if self.headers.iter().any(|h| h == NEW_IMAGE_COLUMN) {
            NEW_IMAGE_COLUMN
        } else {
            S3_URL_COLUMN
        }
    }

    /// Write the processed rows with their results
    ///
    /// Rows are paired with results in order; rows without a result (beyond
    /// a test-mode limit) are not written.
    pub fn write_results(&self, path: &Path, results: &[RowResult]) -> Result<()> {
        let (headers, slots) = self.output_layout();

        let mut writer = WriterBuilder::new()
            .flexible(false)
            .from_path(path)
            .map_err(|e| ImgsyncError::table(format!("failed to create {}: {}", path.display(), e)))?;

        writer
            .write_record(&headers)
            .map_err(|e| ImgsyncError::table(format!("failed to write CSV headers: {}", e)))?;

        for (row, result) in self.rows.iter().zip(results) {
            let values = row.values();
            if values.len() > self.headers.len() {
                warn!(
                    row = row.index(),
                    extra = values.len() - self.headers.len(),
                    "Row has more cells than the header, extra cells dropped"
                );
            }
            let mut record: Vec<String> = values.iter().take(self.headers.len()).cloned().collect();
            record.resize(headers.len(), String::new());

            record[slots.key] = result
                .storage_key
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            record[slots.status] = result.status.to_string();
            record[slots.http_code] = result
                .http_response_code
                .map(|code| code.to_string())
                .unwrap_or_default();
            record[slots.url] = result.public_url.clone().unwrap_or_default();

            writer.write_record(&record).map_err(|e| {
                ImgsyncError::table(format!("failed to write CSV row {}: {}", row.index(), e))
            })?;
        }

        writer
            .flush()
            .map_err(|e| ImgsyncError::table(format!("failed to flush {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), rows = results.len().min(self.rows.len()), "Wrote results");
        Ok(())
    }

    /// Output headers, reusing existing result columns in place
    fn output_layout(&self) -> (Vec<String>, ResultSlots) {
        let mut headers: Vec<String> = self.headers.to_vec();
        let mut slot = |name: &str| match headers.iter().position(|h| h == name) {
            Some(position) => position,
            None => {
                headers.push(name.to_string());
                headers.len() - 1
            },
        };

        let slots = ResultSlots {
            key: slot(KEY_COLUMN),
            status: slot(STATUS_COLUMN),
            http_code: slot(HTTP_CODE_COLUMN),
            url: slot(self.url_column()),
        };
        (headers, slots)
    }
}

struct ResultSlots {
    key: usize,
    status: usize,
    http_code: usize,
    url: usize,
}
