//! S3 photo store
//!
//! Objects are written with their content type so browsers render them
//! directly from the public URL. Works against AWS and S3-compatible
//! endpoints (MinIO, LocalStack) via `BlobConfig::endpoint`.

use async_trait::async_trait;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::{debug, error, info, instrument};

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_claims::{BlobStorePort, PhotoBlob};

use crate::config::BlobConfig;
use crate::error::BlobError;
use crate::keys::{key_from_url, public_url, validate_key};

const ADAPTER_ID: &str = "s3-blob-store";

/// Photo store backed by a single S3 bucket
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
    base_url: String,
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Builds a client from the ambient AWS configuration
    ///
    /// Credentials come from the usual provider chain (environment, profile,
    /// instance role). A custom endpoint switches to path-style addressing.
    pub async fn from_config(config: &BlobConfig) -> Result<Self, BlobError> {
        if config.bucket.trim().is_empty() {
            return Err(BlobError::Configuration("bucket name is empty".to_string()));
        }

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(ref region) = config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(ref endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = S3Client::from_conf(builder.build());

        info!(bucket = %config.bucket, "S3 photo store configured");
        Ok(Self::new(client, &config.bucket, config.resolved_base_url()))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl DomainPort for S3BlobStore {}

#[async_trait]
impl HealthCheckable for S3BlobStore {
    /// Checks the bucket exists and is reachable with our credentials
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = self.client.head_bucket().bucket(&self.bucket).send().await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy(ADAPTER_ID, latency_ms),
            Err(e) => HealthCheckResult::unhealthy(
                ADAPTER_ID,
                latency_ms,
                format!("S3 error: {}", DisplayErrorContext(&e)),
            ),
        }
    }
}

#[async_trait]
impl BlobStorePort for S3BlobStore {
    #[instrument(skip(self, blob), fields(bucket = %self.bucket, size = blob.bytes.len()))]
    async fn upload(&self, key: &str, blob: PhotoBlob) -> Result<String, PortError> {
        let key = validate_key(key)?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(&blob.content_type)
            .body(ByteStream::from(blob.bytes))
            .send()
            .await
            .map_err(|e| {
                error!("S3 put_object failed for {}: {}", key, DisplayErrorContext(&e));
                BlobError::UploadFailed {
                    key: key.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                }
            })?;

        let url = public_url(&self.base_url, key);
        debug!(url = %url, "Photo uploaded");
        Ok(url)
    }

    /// S3 deletes are idempotent, so a missing object is not an error
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete(&self, url: &str) -> Result<(), PortError> {
        let key = self
            .object_key(url)
            .ok_or_else(|| BlobError::ForeignUrl(url.to_string()))?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                error!("S3 delete_object failed for {}: {}", key, DisplayErrorContext(&e));
                BlobError::DeleteFailed {
                    key: key.clone(),
                    message: DisplayErrorContext(&e).to_string(),
                }
            })?;

        debug!(key = %key, "Photo deleted");
        Ok(())
    }

    fn object_key(&self, url: &str) -> Option<String> {
        key_from_url(&self.base_url, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_store(base_url: &str) -> S3BlobStore {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .build();
        S3BlobStore::new(S3Client::from_conf(config), "photos", base_url)
    }

    #[test]
    fn test_object_key_from_bucket_url() {
        let store = offline_store("https://photos.s3.amazonaws.com/");

        assert_eq!(
            store.object_key("https://photos.s3.amazonaws.com/claims/CLM-1/PHO-1.jpg").as_deref(),
            Some("claims/CLM-1/PHO-1.jpg")
        );
        assert_eq!(store.object_key("https://other.s3.amazonaws.com/claims/x.jpg"), None);
        assert_eq!(store.bucket(), "photos");
    }

    #[tokio::test]
    async fn test_foreign_url_delete_fails_without_network() {
        let store = offline_store("https://photos.s3.amazonaws.com");

        let err = store.delete("https://elsewhere.com/x.jpg").await.unwrap_err();
        assert!(matches!(err, PortError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_invalid_key_rejected_before_upload() {
        let store = offline_store("https://photos.s3.amazonaws.com");

        let err = store.upload("../x.jpg", PhotoBlob::jpeg(vec![1])).await.unwrap_err();
        assert!(matches!(err, PortError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_empty_bucket_is_a_configuration_error() {
        let config = BlobConfig {
            backend: crate::BlobBackend::S3,
            bucket: " ".into(),
            ..BlobConfig::default()
        };
        assert!(matches!(
            S3BlobStore::from_config(&config).await,
            Err(BlobError::Configuration(_))
        ));
    }
}
