//! Blob storage error types

use thiserror::Error;

use core_kernel::PortError;

/// Errors raised by the blob adapters
#[derive(Debug, Error)]
pub enum BlobError {
    /// Object key would escape the store or is empty
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// URL was not produced by this store
    #[error("URL is not managed by this store: {0}")]
    ForeignUrl(String),

    #[error("Upload failed for '{key}': {message}")]
    UploadFailed { key: String, message: String },

    #[error("Delete failed for '{key}': {message}")]
    DeleteFailed { key: String, message: String },

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage configuration error: {0}")]
    Configuration(String),
}

impl From<BlobError> for PortError {
    fn from(error: BlobError) -> Self {
        match error {
            BlobError::InvalidKey(key) => PortError::validation_field("Invalid object key", key),
            BlobError::ForeignUrl(url) => PortError::validation_field("Unknown photo URL", url),
            BlobError::Io(e) => PortError::internal_with("blob filesystem error", e),
            other => PortError::connection(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_failure_is_transient() {
        let port: PortError = BlobError::UploadFailed {
            key: "k".into(),
            message: "timeout".into(),
        }
        .into();
        assert!(port.is_transient());
    }

    #[test]
    fn test_invalid_key_is_validation() {
        let port: PortError = BlobError::InvalidKey("../etc".into()).into();
        assert!(matches!(port, PortError::Validation { .. }));
    }
}
