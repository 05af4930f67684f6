//! Member self-service
//!
//! What a member can do with their own claims. Every operation checks that
//! the actor owns the claim before touching it.

use std::sync::Arc;
use tracing::{info, instrument};

use core_kernel::ClaimId;

use crate::actor::Actor;
use crate::claim::{Claim, ClaimPatch};
use crate::error::ClaimError;
use crate::events::ClaimWatch;
use crate::lifecycle::LifecycleController;
use crate::moderation::{search, SearchCriteria};
use crate::photos::PhotoAttachmentManager;
use crate::ports::{ClaimStorePort, PhotoBlob};

#[derive(Clone)]
pub struct MemberSelfService {
    store: Arc<dyn ClaimStorePort>,
    lifecycle: LifecycleController,
    photos: PhotoAttachmentManager,
}

impl MemberSelfService {
    pub fn new(
        store: Arc<dyn ClaimStorePort>,
        lifecycle: LifecycleController,
        photos: PhotoAttachmentManager,
    ) -> Self {
        Self { store, lifecycle, photos }
    }

    /// The actor's claims, drafts included, newest first
    #[instrument(skip(self, actor), fields(identity = %actor.identity))]
    pub async fn my_claims(&self, actor: &Actor) -> Result<Vec<Claim>, ClaimError> {
        let claims = self.store.list_by_owner(&actor.identity).await?;
        Ok(search(claims, &SearchCriteria::default()))
    }

    pub async fn view(&self, claim_id: ClaimId, actor: &Actor) -> Result<Claim, ClaimError> {
        self.owned(claim_id, actor).await
    }

    /// Replaces the narrative; allowed in every status
    #[instrument(skip(self, text, actor), fields(claim_id = %claim_id))]
    pub async fn update_description(
        &self,
        claim_id: ClaimId,
        text: &str,
        actor: &Actor,
    ) -> Result<Claim, ClaimError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClaimError::missing("description"));
        }
        self.owned(claim_id, actor).await?;

        let updated = self.store.merge(claim_id, ClaimPatch::description(text)).await?;
        info!("claim description updated");
        Ok(updated)
    }

    /// Replaces the contact phone; allowed in every status
    #[instrument(skip(self, phone, actor), fields(claim_id = %claim_id))]
    pub async fn update_contact_phone(
        &self,
        claim_id: ClaimId,
        phone: &str,
        actor: &Actor,
    ) -> Result<Claim, ClaimError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Err(ClaimError::missing("userPhoneNumber"));
        }
        self.owned(claim_id, actor).await?;

        let updated = self.store.merge(claim_id, ClaimPatch::phone(phone)).await?;
        info!("claim contact phone updated");
        Ok(updated)
    }

    /// Attaches photos one at a time
    ///
    /// The outer error covers the ownership check. After that every photo
    /// gets its own result and photos attached before a failure stay.
    #[instrument(skip(self, blobs, actor), fields(claim_id = %claim_id, count = blobs.len()))]
    pub async fn add_photos(
        &self,
        claim_id: ClaimId,
        blobs: Vec<PhotoBlob>,
        actor: &Actor,
    ) -> Result<Vec<Result<String, ClaimError>>, ClaimError> {
        self.owned(claim_id, actor).await?;

        let mut results = Vec::with_capacity(blobs.len());
        for blob in blobs {
            results.push(self.photos.attach(claim_id, blob).await);
        }
        Ok(results)
    }

    pub async fn remove_photo(
        &self,
        claim_id: ClaimId,
        url: &str,
        actor: &Actor,
    ) -> Result<(), ClaimError> {
        self.owned(claim_id, actor).await?;
        self.photos.detach(claim_id, url).await
    }

    pub async fn cancel(&self, claim_id: ClaimId, actor: &Actor) -> Result<(), ClaimError> {
        self.lifecycle.cancel(claim_id, actor).await
    }

    /// Changes to the actor's own claims
    pub fn watch(&self, actor: &Actor) -> ClaimWatch {
        ClaimWatch::new(actor.clone(), self.store.subscribe())
    }

    async fn owned(&self, claim_id: ClaimId, actor: &Actor) -> Result<Claim, ClaimError> {
        let claim = self.store.get(claim_id).await?;
        actor.require_owner(&claim)?;
        Ok(claim)
    }
}
