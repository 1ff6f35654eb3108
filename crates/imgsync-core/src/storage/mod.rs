//! Object storage gateway
//!
//! [`StorageGateway`] is the seam the reconciler talks to; [`S3Storage`] is the
//! AWS SDK implementation, which also works against S3-compatible endpoints.

use crate::key::StorageKey;
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStream,
    types::ObjectCannedAcl,
    Client,
};
use imgsync_common::Result;
use thiserror::Error;
use tracing::{debug, info, instrument};

pub mod config;

pub use config::StorageConfig;

/// Content type of every upload.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("existence check for '{key}' failed: {reason}")]
    Head { key: String, reason: String },

    #[error("upload of '{key}' failed: {reason}")]
    Put { key: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub key: String,
    pub checksum: String,
    pub size: usize,
}

#[async_trait]
pub trait StorageGateway: Send + Sync {
    async fn exists(&self, key: &StorageKey) -> std::result::Result<bool, StorageError>;

    /// Write `bytes` to `key` as a publicly readable JPEG, overwriting
    async fn put(&self, key: &StorageKey, bytes: Vec<u8>) -> std::result::Result<UploadResult, StorageError>;

    fn public_url(&self, key: &StorageKey) -> String;
}

#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_base: String,
    public_read: bool,
}

impl S3Storage {
    pub async fn new(config: StorageConfig) -> Result<Self> {
        config.validate()?;
        debug!("Initializing storage with config: {:?}", config);

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "imgsync-storage",
            ));
        }

        let shared = loader.load().await;
        let mut s3_config_builder =
            aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());
        let public_base = config.public_base();

        info!(bucket = %config.bucket, region = %config.region, "Storage client initialized");

        Ok(Self {
            client,
            bucket: config.bucket,
            public_base,
            public_read: config.public_read,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl StorageGateway for S3Storage {
    #[instrument(skip_all, fields(key = %key))]
    async fn exists(&self, key: &StorageKey) -> std::result::Result<bool, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let not_found = e.as_service_error().is_some_and(|se| se.is_not_found())
                    || e.raw_response().is_some_and(|r| r.status().as_u16() == 404);
                if not_found {
                    Ok(false)
                } else {
                    Err(StorageError::Head {
                        key: key.to_string(),
                        reason: sdk_reason(&e),
                    })
                }
            },
        }
    }

    #[instrument(skip_all, fields(key = %key))]
    async fn put(&self, key: &StorageKey, bytes: Vec<u8>) -> std::result::Result<UploadResult, StorageError> {
        let checksum = calculate_sha256(&bytes);
        let size = bytes.len();

        debug!("Uploading {} bytes to s3://{}/{}", size, self.bucket, key);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .content_type(JPEG_CONTENT_TYPE)
            .body(ByteStream::from(bytes));

        if self.public_read {
            request = request.acl(ObjectCannedAcl::PublicRead);
        }

        request.send().await.map_err(|e| StorageError::Put {
            key: key.to_string(),
            reason: sdk_reason(&e),
        })?;

        info!("Uploaded s3://{}/{}", self.bucket, key);

        Ok(UploadResult {
            key: key.to_string(),
            checksum,
            size,
        })
    }

    fn public_url(&self, key: &StorageKey) -> String {
        public_url(&self.public_base, key)
    }
}

/// Join a public base and a key, percent-encoding each key segment
pub fn public_url(base: &str, key: &StorageKey) -> String {
    let encoded = key
        .as_str()
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}", base.trim_end_matches('/'), encoded)
}

fn sdk_reason<E, R>(err: &SdkError<E, R>) -> String
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        (Some(code), None) => code.to_string(),
        _ => DisplayErrorContext(err).to_string(),
    }
}

fn calculate_sha256(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}
