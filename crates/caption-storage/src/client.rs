//! Bucket client implementation.

use std::path::Path;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::publisher::{validate_key, Publisher, VIDEO_CONTENT_TYPE};

/// GCS XML API endpoint (S3 interoperability mode).
pub const DEFAULT_ENDPOINT_URL: &str = "https://storage.googleapis.com";

/// Base of public object URLs.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "https://storage.googleapis.com";

pub const DEFAULT_BUCKET_NAME: &str = "ssm-renders-8822";

/// Configuration for the bucket client.
#[derive(Debug, Clone)]
pub struct BucketConfig {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// HMAC access key ID
    pub access_key_id: String,
    /// HMAC secret
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region ("auto" for GCS)
    pub region: String,
    /// Base URL that public references are built on
    pub public_base_url: String,
}

impl BucketConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("STORAGE_ENDPOINT_URL")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT_URL.to_string()),
            access_key_id: std::env::var("STORAGE_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("STORAGE_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("STORAGE_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("STORAGE_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("GCS_BUCKET_NAME")
                .unwrap_or_else(|_| DEFAULT_BUCKET_NAME.to_string()),
            region: std::env::var("STORAGE_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("STORAGE_PUBLIC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.to_string()),
        })
    }
}

/// S3-compatible bucket client.
#[derive(Clone)]
pub struct BucketClient {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl BucketClient {
    /// Create a new client from configuration.
    pub async fn new(config: BucketConfig) -> StorageResult<Self> {
        if config.bucket_name.trim().is_empty() {
            return Err(StorageError::config_error("bucket name is empty"));
        }

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "caption-storage",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = BucketConfig::from_env()?;
        Self::new(config).await
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public URL of `key`: `<base>/<bucket>/<key>`.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.bucket, key)
    }

    /// Upload a file.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        validate_key(key)?;
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}/{}", path.display(), self.bucket, key);
        Ok(())
    }

    /// Check bucket connectivity.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("Bucket connectivity check failed: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl Publisher for BucketClient {
    async fn publish(&self, path: &Path, destination: &str) -> StorageResult<String> {
        self.upload_file(path, destination, VIDEO_CONTENT_TYPE).await?;
        Ok(self.public_url(destination))
    }

    async fn check(&self) -> StorageResult<()> {
        self.check_connectivity().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BucketConfig {
        BucketConfig {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            access_key_id: "GOOG1EXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            bucket_name: DEFAULT_BUCKET_NAME.to_string(),
            region: "auto".to_string(),
            public_base_url: "https://storage.googleapis.com/".to_string(),
        }
    }

    #[tokio::test]
    async fn test_public_url_format() {
        let client = BucketClient::new(config()).await.unwrap();
        assert_eq!(
            client.public_url("overlay_1.mp4"),
            "https://storage.googleapis.com/ssm-renders-8822/overlay_1.mp4"
        );
    }

    #[tokio::test]
    async fn test_empty_bucket_name_is_rejected() {
        let mut config = config();
        config.bucket_name = " ".to_string();
        assert!(matches!(
            BucketClient::new(config).await,
            Err(StorageError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_upload_rejects_invalid_key() {
        let client = BucketClient::new(config()).await.unwrap();
        let err = client
            .upload_file("/tmp/none.mp4", "../escape.mp4", VIDEO_CONTENT_TYPE)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
