//! Infrastructure Blob Layer
//!
//! Photo storage adapters implementing the claims domain's `BlobStorePort`:
//!
//! - `S3BlobStore`: objects in an S3 (or S3-compatible) bucket
//! - `LocalBlobStore`: files under a directory, for development
//!
//! Both hand out public URLs of the form `{public_base_url}/{key}` and map
//! such URLs back to keys, which is how photo deletion finds its object.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_blob::{BlobConfig, connect};
//!
//! let blobs = connect(&BlobConfig::default()).await?;
//! let url = blobs.store.upload("claims/CLM-1/PHO-1.jpg", photo).await?;
//! ```

pub mod config;
pub mod error;
pub mod keys;
pub mod local;
pub mod s3;

use std::sync::Arc;

use core_kernel::HealthCheckable;
use domain_claims::BlobStorePort;

pub use config::{BlobBackend, BlobConfig};
pub use error::BlobError;
pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

/// A connected blob store, viewed as a port and as a health check
#[derive(Clone)]
pub struct BlobHandles {
    pub store: Arc<dyn BlobStorePort>,
    pub health: Arc<dyn HealthCheckable>,
}

impl BlobHandles {
    fn of<T>(adapter: T) -> Self
    where
        T: BlobStorePort + HealthCheckable,
    {
        let adapter = Arc::new(adapter);
        Self {
            store: adapter.clone(),
            health: adapter,
        }
    }
}

/// Builds the blob store selected by `config`
pub async fn connect(config: &BlobConfig) -> Result<BlobHandles, BlobError> {
    Ok(match config.backend {
        BlobBackend::S3 => BlobHandles::of(S3BlobStore::from_config(config).await?),
        BlobBackend::Local => BlobHandles::of(LocalBlobStore::from_config(config)?),
    })
}
