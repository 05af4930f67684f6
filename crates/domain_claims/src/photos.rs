//! Photo attachment
//!
//! Keeps a claim's `photoURLs` in step with the blob store. Uploads happen
//! before the record is touched, so a failed upload never leaves a dangling
//! reference. Deleting blobs is best-effort: the reference is removed first
//! and a blob that cannot be deleted is only logged.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use core_kernel::{ClaimId, PhotoId};

use crate::claim::{Claim, ClaimPatch, PhotoListChange};
use crate::config::ClaimsConfig;
use crate::error::ClaimError;
use crate::ports::{BlobStorePort, ClaimStorePort, PhotoBlob};

/// Maintains photo references and the blobs behind them
#[derive(Clone)]
pub struct PhotoAttachmentManager {
    store: Arc<dyn ClaimStorePort>,
    blobs: Arc<dyn BlobStorePort>,
    config: Arc<ClaimsConfig>,
}

impl PhotoAttachmentManager {
    pub fn new(
        store: Arc<dyn ClaimStorePort>,
        blobs: Arc<dyn BlobStorePort>,
        config: Arc<ClaimsConfig>,
    ) -> Self {
        Self { store, blobs, config }
    }

    /// Folder every photo of `claim_id` is stored under
    pub fn scope(&self, claim_id: ClaimId) -> String {
        format!("{}/{}/", self.config.photo_path_prefix.trim_end_matches('/'), claim_id)
    }

    /// Whether `url` points at an object inside the claim's own folder
    pub fn is_in_scope(&self, claim_id: ClaimId, url: &str) -> bool {
        let scope = self.scope(claim_id);
        self.blobs
            .object_key(url)
            .map(|key| key.starts_with(&scope))
            .unwrap_or(false)
    }

    /// Uploads a photo and appends its URL to the claim
    ///
    /// # Errors
    ///
    /// * `Validation` when the blob is empty or not an image
    /// * `ClaimNotFound` when the claim does not exist (nothing is uploaded)
    /// * `PhotoLimitReached` when a cap is configured and already reached
    /// * `Transport` when the upload or the merge fails
    #[instrument(skip(self, blob), fields(claim_id = %claim_id, size = blob.bytes.len()))]
    pub async fn attach(&self, claim_id: ClaimId, blob: PhotoBlob) -> Result<String, ClaimError> {
        if blob.bytes.is_empty() || !blob.is_image() {
            return Err(ClaimError::missing("photo"));
        }

        let claim = self.store.get(claim_id).await?;
        if let Some(max) = self.config.max_photos_per_claim {
            if claim.photo_urls.len() >= max {
                return Err(ClaimError::PhotoLimitReached(max));
            }
        }

        let key = format!("{}{}.{}", self.scope(claim_id), PhotoId::new(), blob.extension());
        let url = self.blobs.upload(&key, blob).await?;
        debug!(%key, "photo uploaded");

        if let Err(e) = self
            .store
            .merge(claim_id, ClaimPatch::photos(PhotoListChange::Append(url.clone())))
            .await
        {
            // The record is gone or unreachable; the fresh blob has no owner
            self.delete_blob(&url).await;
            return Err(e.into());
        }

        info!(%url, "photo attached");
        Ok(url)
    }

    /// Removes `url` from the claim, then best-effort deletes the blob
    #[instrument(skip(self), fields(claim_id = %claim_id))]
    pub async fn detach(&self, claim_id: ClaimId, url: &str) -> Result<(), ClaimError> {
        self.store
            .merge(claim_id, ClaimPatch::photos(PhotoListChange::Remove(url.to_string())))
            .await?;

        if self.is_in_scope(claim_id, url) {
            self.delete_blob(url).await;
        } else {
            warn!(%url, "photo is outside the claim's folder, blob kept");
        }

        info!(%url, "photo detached");
        Ok(())
    }

    /// Best-effort deletion of every blob attached to a removed claim
    ///
    /// Returns the number of blobs deleted.
    pub async fn purge(&self, claim: &Claim) -> usize {
        self.release(claim.id, &claim.photo_urls).await
    }

    /// Best-effort deletion of blobs no longer referenced by `claim_id`
    ///
    /// URLs outside the claim's folder are skipped.
    pub async fn release(&self, claim_id: ClaimId, urls: &[String]) -> usize {
        let mut deleted = 0;
        for url in urls {
            if self.is_in_scope(claim_id, url) && self.delete_blob(url).await {
                deleted += 1;
            }
        }
        if deleted > 0 {
            debug!(claim_id = %claim_id, deleted, "photos released");
        }
        deleted
    }

    async fn delete_blob(&self, url: &str) -> bool {
        match self.blobs.delete(url).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%url, error = %e, "failed to delete photo blob");
                false
            }
        }
    }
}
