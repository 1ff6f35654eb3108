//! `imgsync key` command implementation
//!
//! Shows what a run would do with a reference, without touching the network.

use crate::config::Settings;
use crate::error::Result;
use colored::Colorize;
use imgsync_core::{
    key::KeyDeriver,
    reference::{self, Reference},
    storage::public_url,
};

/// Outcome of previewing one reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPreview {
    Valid { key: String, public_url: Option<String> },
    Skipped(String),
    Failed(String),
}

pub async fn run(urls: &[String], settings: Settings) -> Result<()> {
    let keys = settings.key_deriver();
    let base = (!settings.bucket.trim().is_empty()).then(|| settings.storage_config().public_base());

    for url in urls {
        println!("{}", url.bold());
        match preview(url, &keys, base.as_deref()) {
            KeyPreview::Valid { key, public_url } => {
                println!("  {:<8} {}", "key:", key.green());
                match public_url {
                    Some(public_url) => println!("  {:<8} {}", "url:", public_url),
                    None => println!("  {:<8} {}", "url:", "(set --bucket to see the public URL)".dimmed()),
                }
            },
            KeyPreview::Skipped(reason) => {
                println!("  {} SKIPPED_INVALID_URL ({})", "✗".yellow(), reason)
            },
            KeyPreview::Failed(reason) => println!("  {} ERROR: {}", "✗".red(), reason),
        }
    }

    Ok(())
}

/// Validate a raw reference and derive its key and public URL
pub fn preview(raw: &str, keys: &KeyDeriver, public_base: Option<&str>) -> KeyPreview {
    let url = match reference::validate(Some(raw)) {
        Reference::Valid(url) => url,
        Reference::Invalid(reason) => return KeyPreview::Skipped(reason.to_string()),
    };

    match keys.derive(&url) {
        Ok(key) => KeyPreview::Valid {
            public_url: public_base.map(|base| public_url(base, &key)),
            key: key.to_string(),
        },
        Err(e) => KeyPreview::Failed(e.to_string()),
    }
}
