use imgsync_common::{ImgsyncError, Result};
use std::{env, fmt};

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "ap-south-1";

/// Region for custom S3-compatible endpoints, which generally ignore it.
pub const DEFAULT_ENDPOINT_REGION: &str = "us-east-1";

#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom S3-compatible endpoint (MinIO, LocalStack, ...)
    pub endpoint: Option<String>,
    pub path_style: bool,
    /// Static credentials; when unset the default AWS provider chain is used
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Overrides the base of public object URLs, e.g. a CDN in front of the bucket
    pub public_base_url: Option<String>,
    /// Send `x-amz-acl: public-read` with uploads
    pub public_read: bool,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("path_style", &self.path_style)
            .field("access_key", &self.access_key.as_ref().map(|_| "<redacted>"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("public_base_url", &self.public_base_url)
            .field("public_read", &self.public_read)
            .finish()
    }
}

impl StorageConfig {
    pub fn for_aws(region: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            endpoint: None,
            path_style: false,
            access_key: None,
            secret_key: None,
            public_base_url: None,
            public_read: true,
        }
    }

    pub fn for_endpoint(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            path_style: true,
            ..Self::for_aws(DEFAULT_ENDPOINT_REGION, bucket)
        }
    }

    pub fn with_credentials(mut self, access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Pick up `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` when both are set
    pub fn with_env_credentials(self) -> Self {
        match (env::var("AWS_ACCESS_KEY_ID"), env::var("AWS_SECRET_ACCESS_KEY")) {
            (Ok(access), Ok(secret)) if !access.is_empty() && !secret.is_empty() => {
                self.with_credentials(access, secret)
            },
            _ => self,
        }
    }

    /// Base that object keys are appended to for public URLs
    pub fn public_base(&self) -> String {
        if let Some(base) = &self.public_base_url {
            return base.trim_end_matches('/').to_string();
        }
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket),
            None => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(ImgsyncError::config("bucket name must not be empty"));
        }
        if self.region.trim().is_empty() {
            return Err(ImgsyncError::config("region must not be empty"));
        }
        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(ImgsyncError::config(
                "access key and secret key must be given together",
            ));
        }
        Ok(())
    }
}
