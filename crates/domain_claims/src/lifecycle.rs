//! Claim lifecycle
//!
//! The controller is the only code that changes `status` or `assignedTo`,
//! and it decides which actor may do what.
//!
//! ```text
//! (draft) --submit--> Pending --review--> In Review
//!                        |                    |
//!                        +------decide--------+--> Approved | Denied
//!
//! Pending | In Review --member cancel--> (deleted)
//! any                 --admin delete---> (deleted)
//! ```

use std::sync::Arc;
use tracing::{info, instrument};

use core_kernel::ClaimId;

use crate::actor::{Actor, ActorRole};
use crate::claim::{status_label, Claim, ClaimPatch, ClaimStatus};
use crate::error::ClaimError;
use crate::photos::PhotoAttachmentManager;
use crate::ports::ClaimStorePort;

/// Label used for the removed state in transition errors
const DELETED: &str = "Deleted";

/// Whether `role` may move a submitted claim from `from` to `to`
///
/// Members have no status moves of their own; they can only cancel.
pub fn allows(from: ClaimStatus, to: ClaimStatus, role: ActorRole) -> bool {
    use ClaimStatus::*;

    match role {
        ActorRole::Admin => matches!(
            (from, to),
            (Pending, InReview) | (Pending, Approved) | (Pending, Denied)
                | (InReview, Approved) | (InReview, Denied)
        ),
        ActorRole::Member => false,
    }
}

/// Enforces status transitions, assignment and removal
#[derive(Clone)]
pub struct LifecycleController {
    store: Arc<dyn ClaimStorePort>,
    photos: PhotoAttachmentManager,
}

impl LifecycleController {
    pub fn new(store: Arc<dyn ClaimStorePort>, photos: PhotoAttachmentManager) -> Self {
        Self { store, photos }
    }

    /// Moves a submitted claim to `target`
    #[instrument(skip(self, actor), fields(claim_id = %claim_id, target = %target, role = %actor.role))]
    pub async fn transition(
        &self,
        claim_id: ClaimId,
        target: ClaimStatus,
        actor: &Actor,
    ) -> Result<Claim, ClaimError> {
        let claim = self.store.get(claim_id).await?;

        let from = match claim.status {
            Some(from) if allows(from, target, actor.role) => from,
            _ => return Err(ClaimError::invalid_transition(claim.status_label(), target.as_str())),
        };

        let updated = self.store.merge(claim_id, ClaimPatch::status(target)).await?;
        info!(from = %from, "claim status changed");
        Ok(updated)
    }

    /// Withdraws a claim on behalf of its owner
    ///
    /// Only `Pending` and `In Review` claims can be cancelled. The record is
    /// deleted and its photos are purged.
    #[instrument(skip(self, actor), fields(claim_id = %claim_id))]
    pub async fn cancel(&self, claim_id: ClaimId, actor: &Actor) -> Result<(), ClaimError> {
        let claim = self.store.get(claim_id).await?;
        actor.require_owner(&claim)?;

        if !claim.status.map(|s| s.is_cancellable()).unwrap_or(false) {
            return Err(ClaimError::invalid_transition(claim.status_label(), DELETED));
        }

        self.store.delete(claim_id).await?;
        self.photos.purge(&claim).await;
        info!(status = claim.status_label(), "claim cancelled");
        Ok(())
    }

    /// Assigns a service provider; the status is left alone
    #[instrument(skip(self, actor), fields(claim_id = %claim_id))]
    pub async fn assign(
        &self,
        claim_id: ClaimId,
        provider_id: &str,
        actor: &Actor,
    ) -> Result<Claim, ClaimError> {
        actor.require_admin("assign")?;
        let provider_id = provider_id.trim();
        if provider_id.is_empty() {
            return Err(ClaimError::missing("assignedTo"));
        }

        let updated = self
            .store
            .merge(claim_id, ClaimPatch::assigned_to(provider_id))
            .await?;
        info!(provider_id, "claim assigned");
        Ok(updated)
    }

    /// Removes a claim in any state; deleting an absent claim succeeds
    #[instrument(skip(self, actor), fields(claim_id = %claim_id))]
    pub async fn delete(&self, claim_id: ClaimId, actor: &Actor) -> Result<(), ClaimError> {
        actor.require_admin("delete")?;

        let existing = match self.store.get(claim_id).await {
            Ok(claim) => Some(claim),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };

        self.store.delete(claim_id).await?;
        if let Some(claim) = existing {
            self.photos.purge(&claim).await;
            info!(status = claim.status_label(), "claim deleted");
        }
        Ok(())
    }

    /// Submission: merges `fields` and enters `Pending` in one write
    ///
    /// Only the owner may submit, and only a draft.
    #[instrument(skip(self, fields, actor), fields(claim_id = %claim_id))]
    pub async fn enter_pending(
        &self,
        claim_id: ClaimId,
        fields: ClaimPatch,
        actor: &Actor,
    ) -> Result<Claim, ClaimError> {
        let claim = self.store.get(claim_id).await?;
        actor.require_owner(&claim)?;
        if !claim.is_draft() {
            return Err(ClaimError::invalid_transition(
                status_label(claim.status),
                ClaimStatus::Pending.as_str(),
            ));
        }

        let patch = ClaimPatch {
            status: Some(ClaimStatus::Pending),
            ..fields
        };
        let submitted = self.store.merge(claim_id, patch).await?;
        info!("claim submitted");
        Ok(submitted)
    }
}
