//! Image reference validation
//!
//! Decides, without touching the network, whether a row's image reference is
//! something worth probing and fetching or a placeholder to skip.

use crate::table::Row;
use serde::{Deserialize, Serialize};
use url::Url;

/// Column that the product export uses for image links.
pub const DEFAULT_PRIMARY_FIELD: &str = "WOO IMAGE";

/// Generic column names, checked after the primary one.
pub const GENERIC_FIELDS: &[&str] = &["s3_url", "image_url", "url"];

/// Values that mean "no image yet" (compared case-insensitively).
pub const PLACEHOLDER_TOKENS: &[&str] = &["pending", "n/a", "na", "none", "tbd", "null"];

/// Outcome of validating a raw reference value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Valid(Url),
    Invalid(InvalidReason),
}

impl Reference {
    pub fn is_valid(&self) -> bool {
        matches!(self, Reference::Valid(_))
    }

    pub fn url(&self) -> Option<&Url> {
        match self {
            Reference::Valid(url) => Some(url),
            Reference::Invalid(_) => None,
        }
    }
}

/// Why a reference was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    /// No recognized column, or an empty value
    Missing,
    /// A known placeholder such as `PENDING` or `N/A`
    Placeholder(String),
    /// Not an absolute http(s) URL with a host
    NotAbsoluteUrl(String),
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidReason::Missing => write!(f, "missing or empty reference"),
            InvalidReason::Placeholder(value) => write!(f, "placeholder value '{}'", value),
            InvalidReason::NotAbsoluteUrl(value) => write!(f, "not an absolute URL: '{}'", value),
        }
    }
}

/// Classify a raw field value
pub fn validate(raw: Option<&str>) -> Reference {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Reference::Invalid(InvalidReason::Missing);
    };

    if PLACEHOLDER_TOKENS
        .iter()
        .any(|token| value.eq_ignore_ascii_case(token))
    {
        return Reference::Invalid(InvalidReason::Placeholder(value.to_string()));
    }

    match Url::parse(value) {
        Ok(url) if is_fetchable(&url) => Reference::Valid(url),
        _ => Reference::Invalid(InvalidReason::NotAbsoluteUrl(value.to_string())),
    }
}

fn is_fetchable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
}

/// Recognized reference column names in priority order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceFields(Vec<String>);

impl Default for ReferenceFields {
    fn default() -> Self {
        Self::with_primary(DEFAULT_PRIMARY_FIELD)
    }
}

impl ReferenceFields {
    /// Primary column first, then the generic fallbacks
    pub fn with_primary(primary: impl Into<String>) -> Self {
        let primary = primary.into();
        let mut names = vec![primary.clone()];
        names.extend(
            GENERIC_FIELDS
                .iter()
                .filter(|name| **name != primary)
                .map(|name| name.to_string()),
        );
        Self(names)
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// First recognized column present in the row, with its value
    pub fn pick<'r>(&self, row: &'r Row) -> Option<(&'r str, &'r str)> {
        self.0
            .iter()
            .find_map(|name| row.field(name))
    }

    /// First recognized column present in a header row
    pub fn detect<'h>(&self, headers: &'h [String]) -> Option<&'h str> {
        self.0
            .iter()
            .find_map(|name| headers.iter().find(|h| *h == name).map(String::as_str))
    }
}
