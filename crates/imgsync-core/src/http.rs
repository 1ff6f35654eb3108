//! Shared reqwest client setup

use imgsync_common::{ImgsyncError, Result};
use reqwest::Client;
use std::time::Duration;

/// Default timeout for probes and source downloads, in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

const USER_AGENT: &str = concat!("imgsync/", env!("CARGO_PKG_VERSION"));

/// Build the client used for probing and fetching
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ImgsyncError::http(format!("failed to build HTTP client: {}", e)))
}

/// Short cause for a transport failure, suitable for a status column
pub(crate) fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else if err.is_redirect() {
        "too many redirects".to_string()
    } else if err.is_body() || err.is_decode() {
        "could not read response body".to_string()
    } else {
        let mut reason = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(inner) = source {
            reason = format!("{}: {}", reason, inner);
            source = inner.source();
        }
        reason
    }
}
