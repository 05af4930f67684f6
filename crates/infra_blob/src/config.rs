//! Blob storage configuration

use serde::Deserialize;

/// Which adapter backs photo storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackend {
    S3,
    #[default]
    Local,
}

/// Blob storage settings
///
/// `public_base_url` is the prefix every returned photo URL starts with. For
/// S3 it defaults to the bucket's virtual-hosted endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BlobConfig {
    pub backend: BlobBackend,
    pub bucket: String,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services (MinIO, LocalStack)
    pub endpoint: Option<String>,
    pub public_base_url: Option<String>,
    /// Directory the local backend writes into
    pub local_root: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            backend: BlobBackend::Local,
            bucket: "claim-photos".to_string(),
            region: None,
            endpoint: None,
            public_base_url: None,
            local_root: "./data/blobs".to_string(),
        }
    }
}

impl BlobConfig {
    /// Base URL photo URLs are built from
    pub fn resolved_base_url(&self) -> String {
        if let Some(ref base) = self.public_base_url {
            return base.trim_end_matches('/').to_string();
        }
        match self.backend {
            BlobBackend::S3 => match (&self.endpoint, &self.region) {
                (Some(endpoint), _) => {
                    format!("{}/{}", endpoint.trim_end_matches('/'), self.bucket)
                }
                (None, Some(region)) => {
                    format!("https://{}.s3.{}.amazonaws.com", self.bucket, region)
                }
                (None, None) => format!("https://{}.s3.amazonaws.com", self.bucket),
            },
            BlobBackend::Local => format!("file://{}", self.local_root.trim_end_matches('/')),
        }
    }
}
