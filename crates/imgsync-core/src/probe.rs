//! Public accessibility probe
//!
//! Existence in the bucket says nothing about whether the object can be served
//! to the public, so every existing object is also probed through its public
//! URL with a HEAD request.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Result of probing a public URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// HTTP status, if a response arrived at all
    pub http_status: Option<u16>,
    pub reachable: bool,
}

impl ProbeOutcome {
    pub fn status(code: u16) -> Self {
        Self {
            http_status: Some(code),
            reachable: true,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            http_status: None,
            reachable: false,
        }
    }

    /// Only a plain 200 counts as publicly servable
    pub fn is_accessible(&self) -> bool {
        self.http_status == Some(200)
    }
}

/// Read-only accessibility check
///
/// Implementations must not fail: any fault is reported as
/// [`ProbeOutcome::unreachable`].
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// HEAD-request prober
#[derive(Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.client.head(url).send().await {
            Ok(response) => {
                let code = response.status().as_u16();
                debug!(url, status = code, "Probe answered");
                ProbeOutcome::status(code)
            },
            Err(e) => {
                debug!(url, error = %crate::http::describe(&e), "Probe failed");
                ProbeOutcome::unreachable()
            },
        }
    }
}
