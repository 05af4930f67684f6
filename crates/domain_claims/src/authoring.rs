//! Claim authoring
//!
//! Claims are created in two steps. `draft` snapshots the vehicle and member
//! and returns an id, so photos can be uploaded under that id while the
//! member fills in the form. `submit` validates the details and hands the
//! claim to moderation as `Pending`. Drafts are invisible to moderators.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use core_kernel::{ClaimId, Clock};

use crate::actor::Actor;
use crate::claim::{ClaimPatch, MemberSnapshot, NewClaim, PhotoListChange, VehicleSnapshot, Claim};
use crate::config::ClaimsConfig;
use crate::error::ClaimError;
use crate::lifecycle::LifecycleController;
use crate::photos::PhotoAttachmentManager;
use crate::ports::ClaimStorePort;

/// Incident details supplied when a draft is submitted
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimSubmission {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Falls back to the phone captured in the draft when unset
    #[serde(default)]
    pub user_phone_number: Option<String>,
    pub date: NaiveDate,
    /// Narrows the photo list to these URLs when given; each must already be
    /// attached to the draft. Photos attached to the draft are kept otherwise.
    #[serde(default, rename = "photoURLs")]
    pub photo_urls: Option<Vec<String>>,
}

impl ClaimSubmission {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            amount: None,
            description: None,
            location: None,
            user_phone_number: None,
            date,
            photo_urls: None,
        }
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.user_phone_number = Some(phone.into());
        self
    }

    /// Checks the submission against the draft it completes
    ///
    /// Every missing field is reported in the one error.
    fn validate(&self, draft: &Claim, photos: &PhotoAttachmentManager) -> Result<(), ClaimError> {
        let mut fields = Vec::new();

        if is_blank(self.description.as_deref()) {
            fields.push("description".to_string());
        }
        if is_blank(self.user_phone_number.as_deref())
            && is_blank(draft.member.user_phone_number.as_deref())
        {
            fields.push("userPhoneNumber".to_string());
        }
        match self.amount {
            Some(amount) if amount >= Decimal::ZERO => {}
            _ => fields.push("amount".to_string()),
        }
        if !draft.vehicle.is_present() {
            fields.push("vehicle".to_string());
        }
        if let Some(ref urls) = self.photo_urls {
            let attached = |url: &String| {
                draft.photo_urls.contains(url) && photos.is_in_scope(draft.id, url)
            };
            if !urls.iter().all(attached) {
                fields.push("photoURLs".to_string());
            }
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(ClaimError::Validation { fields })
        }
    }

    fn into_patch(self) -> ClaimPatch {
        ClaimPatch {
            amount: self.amount,
            description: self.description.map(|d| d.trim().to_string()),
            location: self.location.filter(|l| !l.trim().is_empty()),
            date: Some(self.date),
            user_phone_number: self
                .user_phone_number
                .filter(|p| !p.trim().is_empty())
                .map(|p| p.trim().to_string()),
            photo_urls: self.photo_urls.map(PhotoListChange::Replace),
            ..Default::default()
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(|v| v.trim().is_empty()).unwrap_or(true)
}

/// Drafting and submission of new claims
#[derive(Clone)]
pub struct AuthoringWorkflow {
    store: Arc<dyn ClaimStorePort>,
    lifecycle: LifecycleController,
    photos: PhotoAttachmentManager,
    clock: Arc<dyn Clock>,
    config: Arc<ClaimsConfig>,
}

impl AuthoringWorkflow {
    pub fn new(
        store: Arc<dyn ClaimStorePort>,
        lifecycle: LifecycleController,
        photos: PhotoAttachmentManager,
        clock: Arc<dyn Clock>,
        config: Arc<ClaimsConfig>,
    ) -> Self {
        Self { store, lifecycle, photos, clock, config }
    }

    /// Creates a draft for the member's chosen vehicle
    #[instrument(skip(self, vehicle, member, actor), fields(vehicle = %vehicle.describe()))]
    pub async fn draft(
        &self,
        vehicle: VehicleSnapshot,
        member: MemberSnapshot,
        actor: &Actor,
    ) -> Result<ClaimId, ClaimError> {
        let mut fields = Vec::new();
        for (name, value) in [
            ("vehicleMake", &vehicle.vehicle_make),
            ("vehicleModel", &vehicle.vehicle_model),
            ("userFirstName", &member.user_first_name),
            ("userLastName", &member.user_last_name),
            ("userEmail", &member.user_email),
        ] {
            if value.trim().is_empty() {
                fields.push(name.to_string());
            }
        }
        if !fields.is_empty() {
            return Err(ClaimError::Validation { fields });
        }

        if !actor.is_admin() && !member.user_email.trim().eq_ignore_ascii_case(actor.identity.trim()) {
            return Err(ClaimError::forbidden("members can only file claims for themselves"));
        }

        let id = self.store.create(NewClaim::new(vehicle, member)).await?;
        info!(claim_id = %id, "claim drafted");
        Ok(id)
    }

    /// Validates and submits a draft, which becomes `Pending`
    ///
    /// A failed validation leaves the draft as it was.
    #[instrument(skip(self, submission, actor), fields(claim_id = %claim_id))]
    pub async fn submit(
        &self,
        claim_id: ClaimId,
        submission: ClaimSubmission,
        actor: &Actor,
    ) -> Result<Claim, ClaimError> {
        let draft = self.store.get(claim_id).await?;
        actor.require_owner(&draft)?;
        if !draft.is_draft() {
            return Err(ClaimError::invalid_transition(draft.status_label(), "Pending"));
        }

        submission.validate(&draft, &self.photos)?;
        let submitted = self
            .lifecycle
            .enter_pending(claim_id, submission.into_patch(), actor)
            .await?;

        let dropped: Vec<String> = draft
            .photo_urls
            .into_iter()
            .filter(|url| !submitted.photo_urls.contains(url))
            .collect();
        self.photos.release(claim_id, &dropped).await;
        Ok(submitted)
    }

    /// Throws away a draft the owner no longer wants
    #[instrument(skip(self, actor), fields(claim_id = %claim_id))]
    pub async fn discard_draft(&self, claim_id: ClaimId, actor: &Actor) -> Result<(), ClaimError> {
        let draft = self.store.get(claim_id).await?;
        actor.require_owner(&draft)?;
        if !draft.is_draft() {
            return Err(ClaimError::invalid_transition(draft.status_label(), "Deleted"));
        }

        self.store.delete(claim_id).await?;
        self.photos.purge(&draft).await;
        info!("draft discarded");
        Ok(())
    }

    /// Deletes drafts older than the configured TTL
    ///
    /// Does nothing unless `draft_ttl_hours` is set. Returns how many drafts
    /// were removed.
    #[instrument(skip(self, actor))]
    pub async fn reap_abandoned_drafts(&self, actor: &Actor) -> Result<usize, ClaimError> {
        actor.require_admin("reap drafts")?;
        let ttl = match self.config.draft_ttl() {
            Some(ttl) => ttl,
            None => return Ok(0),
        };
        let cutoff = self.clock.now() - ttl;

        let is_abandoned =
            |c: &Claim| c.is_draft() && c.created_at.map(|t| t < cutoff).unwrap_or(false);
        let candidates: Vec<ClaimId> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter(|c| is_abandoned(c))
            .map(|c| c.id)
            .collect();

        let mut reaped = 0;
        for id in candidates {
            // The listing may be stale: the owner can submit or discard meanwhile
            let draft = match self.store.get(id).await {
                Ok(claim) if is_abandoned(&claim) => claim,
                Ok(_) => {
                    debug!(claim_id = %id, "draft submitted since listing, kept");
                    continue;
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    warn!(claim_id = %id, error = %e, "failed to reload draft");
                    continue;
                }
            };
            match self.store.delete(id).await {
                Ok(()) => {
                    self.photos.purge(&draft).await;
                    reaped += 1;
                }
                Err(e) => warn!(claim_id = %id, error = %e, "failed to reap draft"),
            }
        }

        if reaped > 0 {
            info!(reaped, "abandoned drafts reaped");
        }
        Ok(reaped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::ClaimStatus;
    use crate::events::ClaimEvent;
    use crate::ports::mock::{InMemoryBlobStore, InMemoryClaimStore};
    use crate::ports::{BlobStorePort, PhotoBlob};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, ManualClock, PortError};
    use rust_decimal_macros::dec;
    use tokio::sync::broadcast;

    struct Fixture {
        store: Arc<InMemoryClaimStore>,
        blobs: Arc<InMemoryBlobStore>,
        clock: Arc<ManualClock>,
        photos: PhotoAttachmentManager,
        authoring: AuthoringWorkflow,
    }

    fn workflow(
        store: Arc<dyn ClaimStorePort>,
        blobs: Arc<dyn BlobStorePort>,
        clock: Arc<ManualClock>,
        config: Arc<ClaimsConfig>,
    ) -> (PhotoAttachmentManager, AuthoringWorkflow) {
        let photos = PhotoAttachmentManager::new(store.clone(), blobs, config.clone());
        let lifecycle = LifecycleController::new(store.clone(), photos.clone());
        let authoring = AuthoringWorkflow::new(store, lifecycle, photos.clone(), clock, config);
        (photos, authoring)
    }

    fn fixture(config: ClaimsConfig) -> Fixture {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()));
        let store = Arc::new(InMemoryClaimStore::with_clock(clock.clone()));
        let blobs = Arc::new(InMemoryBlobStore::new());
        let (photos, authoring) =
            workflow(store.clone(), blobs.clone(), clock.clone(), Arc::new(config));
        Fixture { store, blobs, clock, photos, authoring }
    }

    /// Store whose listing was taken before later writes
    struct StaleListing {
        inner: Arc<InMemoryClaimStore>,
        listing: Vec<Claim>,
    }

    impl DomainPort for StaleListing {}

    #[async_trait]
    impl HealthCheckable for StaleListing {
        async fn health_check(&self) -> HealthCheckResult {
            self.inner.health_check().await
        }
    }

    #[async_trait]
    impl ClaimStorePort for StaleListing {
        async fn get(&self, id: ClaimId) -> Result<Claim, PortError> {
            self.inner.get(id).await
        }
        async fn create(&self, claim: NewClaim) -> Result<ClaimId, PortError> {
            self.inner.create(claim).await
        }
        async fn merge(&self, id: ClaimId, patch: ClaimPatch) -> Result<Claim, PortError> {
            self.inner.merge(id, patch).await
        }
        async fn delete(&self, id: ClaimId) -> Result<(), PortError> {
            self.inner.delete(id).await
        }
        async fn list_by_owner(&self, owner_email: &str) -> Result<Vec<Claim>, PortError> {
            self.inner.list_by_owner(owner_email).await
        }
        async fn list_all(&self) -> Result<Vec<Claim>, PortError> {
            Ok(self.listing.clone())
        }
        fn subscribe(&self) -> broadcast::Receiver<ClaimEvent> {
            self.inner.subscribe()
        }
    }

    fn civic() -> VehicleSnapshot {
        VehicleSnapshot::new(2020, "Honda", "Civic")
    }

    fn jane() -> MemberSnapshot {
        MemberSnapshot::new("Jane", "Doe", "jane@x.com")
    }

    fn member() -> Actor {
        Actor::member("jane@x.com")
    }

    fn complete_submission() -> ClaimSubmission {
        ClaimSubmission::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
            .with_amount(dec!(500))
            .with_description("Rear-ended")
            .with_phone("555-1111")
    }

    #[tokio::test]
    async fn test_draft_then_submit() {
        let f = fixture(ClaimsConfig::default());
        let id = f.authoring.draft(civic(), jane(), &member()).await.unwrap();
        assert!(f.store.get(id).await.unwrap().is_draft());

        let claim = f.authoring.submit(id, complete_submission(), &member()).await.unwrap();

        assert_eq!(claim.status, Some(ClaimStatus::Pending));
        assert_eq!(claim.amount, Some(dec!(500)));
        assert_eq!(claim.vehicle.vehicle_make, "Honda");
        assert_eq!(claim.member.user_phone_number.as_deref(), Some("555-1111"));
    }

    #[tokio::test]
    async fn test_submit_reports_every_missing_field() {
        let f = fixture(ClaimsConfig::default());
        let id = f.authoring.draft(civic(), jane(), &member()).await.unwrap();

        let bare = ClaimSubmission::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        let err = f.authoring.submit(id, bare, &member()).await.unwrap_err();

        match err {
            ClaimError::Validation { fields } => {
                assert_eq!(fields, vec!["description", "userPhoneNumber", "amount"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(f.store.get(id).await.unwrap().is_draft());
    }

    #[tokio::test]
    async fn test_submit_rejects_negative_amount() {
        let f = fixture(ClaimsConfig::default());
        let id = f.authoring.draft(civic(), jane(), &member()).await.unwrap();
        let err = f
            .authoring
            .submit(id, complete_submission().with_amount(dec!(-1)), &member())
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::Validation { fields } if fields == vec!["amount"]));
    }

    #[tokio::test]
    async fn test_phone_from_draft_satisfies_submission() {
        let f = fixture(ClaimsConfig::default());
        let id = f
            .authoring
            .draft(civic(), jane().with_phone("555-2222"), &member())
            .await
            .unwrap();
        let mut submission = complete_submission();
        submission.user_phone_number = None;

        let claim = f.authoring.submit(id, submission, &member()).await.unwrap();
        assert_eq!(claim.member.user_phone_number.as_deref(), Some("555-2222"));
    }

    #[tokio::test]
    async fn test_draft_requires_vehicle_and_own_email() {
        let f = fixture(ClaimsConfig::default());
        let err = f
            .authoring
            .draft(VehicleSnapshot::new(2020, "", ""), jane(), &member())
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::Validation { .. }));

        let err = f
            .authoring
            .draft(civic(), jane(), &Actor::member("john@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClaimError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_discard_only_drafts() {
        let f = fixture(ClaimsConfig::default());
        let id = f.authoring.draft(civic(), jane(), &member()).await.unwrap();
        f.authoring.discard_draft(id, &member()).await.unwrap();
        assert!(f.store.is_empty().await);

        let id = f.authoring.draft(civic(), jane(), &member()).await.unwrap();
        f.authoring.submit(id, complete_submission(), &member()).await.unwrap();
        let err = f.authoring.discard_draft(id, &member()).await.unwrap_err();
        assert!(err.is_invalid_transition());
    }

    #[tokio::test]
    async fn test_reaper_is_opt_in() {
        let f = fixture(ClaimsConfig::default());
        f.authoring.draft(civic(), jane(), &member()).await.unwrap();
        f.clock.advance(Duration::days(365));

        assert_eq!(f.authoring.reap_abandoned_drafts(&Actor::admin("ops")).await.unwrap(), 0);
        assert_eq!(f.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_reaper_removes_only_stale_drafts() {
        let f = fixture(ClaimsConfig::default().with_draft_ttl_hours(24));
        let stale = f.authoring.draft(civic(), jane(), &member()).await.unwrap();
        let submitted = f.authoring.draft(civic(), jane(), &member()).await.unwrap();
        f.authoring.submit(submitted, complete_submission(), &member()).await.unwrap();

        f.clock.advance(Duration::hours(25));
        let fresh = f.authoring.draft(civic(), jane(), &member()).await.unwrap();

        let admin = Actor::admin("ops");
        assert_eq!(f.authoring.reap_abandoned_drafts(&admin).await.unwrap(), 1);
        assert!(f.store.get(stale).await.unwrap_err().is_not_found());
        assert!(f.store.get(submitted).await.is_ok());
        assert!(f.store.get(fresh).await.is_ok());

        let err = f.authoring.reap_abandoned_drafts(&member()).await.unwrap_err();
        assert!(matches!(err, ClaimError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_reaper_keeps_draft_submitted_after_listing() {
        let f = fixture(ClaimsConfig::default().with_draft_ttl_hours(24));
        let id = f.authoring.draft(civic(), jane(), &member()).await.unwrap();
        let url = f.photos.attach(id, PhotoBlob::jpeg(vec![1])).await.unwrap();
        f.clock.advance(Duration::hours(25));

        let listing = f.store.list_all().await.unwrap();
        f.authoring.submit(id, complete_submission(), &member()).await.unwrap();

        let stale = Arc::new(StaleListing { inner: f.store.clone(), listing });
        let config = Arc::new(ClaimsConfig::default().with_draft_ttl_hours(24));
        let (_, reaper) = workflow(stale, f.blobs.clone(), f.clock.clone(), config);

        assert_eq!(reaper.reap_abandoned_drafts(&Actor::admin("ops")).await.unwrap(), 0);
        let claim = f.store.get(id).await.unwrap();
        assert_eq!(claim.status, Some(ClaimStatus::Pending));
        assert!(f.blobs.contains(&url).await);
    }

    #[tokio::test]
    async fn test_submit_rejects_photos_from_another_claim() {
        let f = fixture(ClaimsConfig::default());
        let mine = f.authoring.draft(civic(), jane(), &member()).await.unwrap();
        let john = MemberSnapshot::new("John", "Roe", "john@x.com");
        let theirs = f
            .authoring
            .draft(civic(), john, &Actor::member("john@x.com"))
            .await
            .unwrap();
        let their_url = f.photos.attach(theirs, PhotoBlob::jpeg(vec![1])).await.unwrap();

        for urls in [vec![their_url.clone()], vec!["https://elsewhere.example/x.jpg".to_string()]] {
            let mut submission = complete_submission();
            submission.photo_urls = Some(urls);
            let err = f.authoring.submit(mine, submission, &member()).await.unwrap_err();
            assert!(matches!(err, ClaimError::Validation { ref fields } if fields == &vec!["photoURLs"]));
        }

        let draft = f.store.get(mine).await.unwrap();
        assert!(draft.is_draft());
        assert!(draft.photo_urls.is_empty());
        assert!(f.blobs.contains(&their_url).await);
    }

    #[tokio::test]
    async fn test_submit_can_drop_draft_photos() {
        let f = fixture(ClaimsConfig::default());
        let id = f.authoring.draft(civic(), jane(), &member()).await.unwrap();
        let keep = f.photos.attach(id, PhotoBlob::jpeg(vec![1])).await.unwrap();
        let dropped = f.photos.attach(id, PhotoBlob::jpeg(vec![2])).await.unwrap();

        let mut submission = complete_submission();
        submission.photo_urls = Some(vec![keep.clone()]);
        let claim = f.authoring.submit(id, submission, &member()).await.unwrap();

        assert_eq!(claim.photo_urls, vec![keep.clone()]);
        assert!(f.blobs.contains(&keep).await);
        assert!(!f.blobs.contains(&dropped).await);
    }
}
