//! Filesystem-backed photo store for development and single-host setups

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_claims::{BlobStorePort, PhotoBlob};

use crate::config::BlobConfig;
use crate::error::BlobError;
use crate::keys::{key_from_url, public_url, validate_key};

const ADAPTER_ID: &str = "local-blob-store";

/// Stores each object as a file at `{root}/{key}`
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Creates the store and its root directory
    pub fn from_config(config: &BlobConfig) -> Result<Self, BlobError> {
        std::fs::create_dir_all(&config.local_root)?;
        Ok(Self::new(&config.local_root, config.resolved_base_url()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        Ok(self.root.join(validate_key(key)?))
    }

    async fn write(&self, key: &str, blob: PhotoBlob) -> Result<String, BlobError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &blob.bytes).await?;
        Ok(public_url(&self.base_url, key))
    }

    async fn remove(&self, url: &str) -> Result<(), BlobError> {
        let key = self
            .object_key(url)
            .ok_or_else(|| BlobError::ForeignUrl(url.to_string()))?;
        match tokio::fs::remove_file(self.path_for(&key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key = %key, "Photo already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl DomainPort for LocalBlobStore {}

#[async_trait]
impl HealthCheckable for LocalBlobStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = tokio::fs::metadata(&self.root).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(meta) if meta.is_dir() => HealthCheckResult::healthy(ADAPTER_ID, latency_ms),
            Ok(_) => HealthCheckResult::unhealthy(ADAPTER_ID, latency_ms, "root is not a directory"),
            Err(e) => HealthCheckResult::unhealthy(ADAPTER_ID, latency_ms, e.to_string()),
        }
    }
}

#[async_trait]
impl BlobStorePort for LocalBlobStore {
    #[instrument(skip(self, blob), fields(size = blob.bytes.len()))]
    async fn upload(&self, key: &str, blob: PhotoBlob) -> Result<String, PortError> {
        let url = self.write(key, blob).await.map_err(|e| {
            warn!(error = %e, "Local photo write failed");
            PortError::from(e)
        })?;
        debug!(url = %url, "Photo stored");
        Ok(url)
    }

    #[instrument(skip(self))]
    async fn delete(&self, url: &str) -> Result<(), PortError> {
        Ok(self.remove(url).await?)
    }

    fn object_key(&self, url: &str) -> Option<String> {
        key_from_url(&self.base_url, url)
    }
}
