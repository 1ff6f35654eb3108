//! Source image download

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("download of {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("download of {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Fetches the raw bytes behind a reference URL
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// GET-request fetcher; non-2xx answers are errors
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let transport = |e: reqwest::Error| FetchError::Transport {
            url: url.to_string(),
            reason: crate::http::describe(&e),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(transport)?;
        debug!(%url, size = bytes.len(), "Downloaded source image");

        Ok(bytes.to_vec())
    }
}
