//! Storage key derivation
//!
//! A row's storage key is a pure function of its reference URL, so running
//! the same table twice lands on the same objects.
//!
//! Rules:
//! - WordPress media (`.../wp-content/...`) keeps the path from `wp-content/` on,
//!   anything else keeps the whole URL path
//! - every segment is percent-decoded, then letters, digits and `._-` are kept and
//!   every other character is percent-encoded, so distinct segments never share a
//!   key; empty, `.` and `..` segments are dropped
//! - a non-empty query is folded into the file name as an encoded `?...` suffix
//! - the file name ends in `.jpg`, because uploads are always re-encoded as JPEG
//!
//! Buckets filled by older tooling hold objects under the raw URL path instead.
//! [`KeyDeriver::candidates`] lists those legacy spellings after the normalized
//! key so existing objects are found rather than uploaded twice.

use thiserror::Error;
use url::Url;

/// Marker for WordPress media paths.
pub const WP_CONTENT_MARKER: &str = "/wp-content/";

/// Extensions swapped for `.jpg` instead of having `.jpg` appended.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpeg", "jpg", "gif", "webp"];

/// Deterministic destination path for a row's image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment, used for debug image file names
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StorageKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("no usable path in '{0}' to derive a storage key from")]
    NoPath(String),
}

/// Derives storage keys, optionally under a fixed prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyDeriver {
    prefix: Vec<String>,
}

impl KeyDeriver {
    pub fn new(prefix: Option<&str>) -> Self {
        let prefix = prefix
            .map(|p| p.split('/').filter_map(normalize_segment).collect())
            .unwrap_or_default();
        Self { prefix }
    }

    pub fn prefix(&self) -> Option<String> {
        (!self.prefix.is_empty()).then(|| self.prefix.join("/"))
    }

    pub fn derive(&self, url: &Url) -> Result<StorageKey, KeyError> {
        let mut segments: Vec<String> = path_tail(url)
            .split('/')
            .filter_map(normalize_segment)
            .collect();

        let Some(file_name) = segments.pop() else {
            return Err(KeyError::NoPath(url.to_string()));
        };
        let query = url.query().filter(|q| !q.is_empty()).map(encode_query);
        segments.push(with_jpg_extension(&file_name, query.as_deref()));

        Ok(self.join(segments.iter().map(String::as_str)))
    }

    /// Normalized key first, then the legacy spellings of the same path
    ///
    /// Legacy spellings are the raw path as older uploads stored it (extension
    /// swapped for `.jpg`), its percent-decoded form and its re-encoded form.
    /// Duplicates are dropped, order is preserved.
    pub fn candidates(&self, url: &Url) -> Result<Vec<StorageKey>, KeyError> {
        let mut keys = vec![self.derive(url)?];

        if let Some(raw) = legacy_path(url) {
            let decoded = urlencoding::decode(&raw).ok().map(|s| s.into_owned());
            let encoded = decoded.as_deref().map(|d| {
                d.split('/')
                    .map(|segment| urlencoding::encode(segment).into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            });

            for path in std::iter::once(raw).chain(decoded).chain(encoded) {
                let key = self.join(std::iter::once(path.as_str()));
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }

        Ok(keys)
    }

    fn join<'a>(&'a self, tail: impl Iterator<Item = &'a str>) -> StorageKey {
        let key = self
            .prefix
            .iter()
            .map(String::as_str)
            .chain(tail)
            .collect::<Vec<_>>()
            .join("/");
        StorageKey(key)
    }
}

fn path_tail(url: &Url) -> &str {
    let path = url.path();
    match path.find(WP_CONTENT_MARKER) {
        Some(start) => &path[start + 1..],
        None => path,
    }
}

/// Path as older uploads keyed it: WordPress media always ends in `.jpg`,
/// other paths only swap a known image extension
fn legacy_path(url: &Url) -> Option<String> {
    let is_wp_content = url.path().contains(WP_CONTENT_MARKER);
    let tail = path_tail(url).trim_start_matches('/');
    if tail.is_empty() {
        return None;
    }

    let (dir, file_name) = match tail.rsplit_once('/') {
        Some((dir, file_name)) => (Some(dir), file_name),
        None => (None, tail),
    };
    let file_name = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => {
            format!("{}.jpg", stem)
        },
        Some((stem, _)) if !stem.is_empty() && is_wp_content => format!("{}.jpg", stem),
        _ if is_wp_content => format!("{}.jpg", file_name),
        _ => file_name.to_string(),
    };

    Some(match dir {
        Some(dir) => format!("{}/{}", dir, file_name),
        None => file_name,
    })
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}

fn normalize_segment(raw: &str) -> Option<String> {
    let decoded = decode(raw);
    let trimmed = decoded.trim();
    match trimmed {
        "" | "." | ".." => None,
        _ => Some(encode_unsafe(trimmed)),
    }
}

fn encode_query(raw: &str) -> String {
    encode_unsafe(&decode(&raw.replace('+', " ")))
}

/// Keeps letters, digits and `._-`; every other character becomes `%XX` per
/// UTF-8 byte. `%` itself is always encoded, so the mapping is reversible.
fn encode_unsafe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    out
}

fn with_jpg_extension(file_name: &str, query: Option<&str>) -> String {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) => stem,
        _ => file_name,
    };
    match query {
        Some(query) => format!("{}%3F{}.jpg", stem, query),
        None => format!("{}.jpg", stem),
    }
}
