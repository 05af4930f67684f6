//! Claims Domain Ports
//!
//! The claims core needs two collaborators: a document store for claim
//! records and a blob store for photo bytes. Both are traits so the
//! PostgreSQL/S3 adapters, a local-disk adapter and the in-memory mocks are
//! interchangeable.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_claims::ports::{ClaimStorePort, BlobStorePort};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn ClaimStorePort> = Arc::new(PostgresClaimStore::new(pool));
//! let blobs: Arc<dyn BlobStorePort> = Arc::new(S3BlobStore::from_env(config).await);
//! let services = ClaimServices::new(store, blobs, ClaimsConfig::default());
//! ```

use async_trait::async_trait;
use tokio::sync::broadcast;

use core_kernel::{ClaimId, PortError, DomainPort, HealthCheckable};

use crate::claim::{Claim, ClaimPatch, NewClaim};
use crate::events::ClaimEvent;

/// Persistence of claim records, keyed by id
///
/// Each call is atomic for the one record it touches; nothing spans
/// records. Concurrent merges on the same record are last-write-wins per
/// field.
#[async_trait]
pub trait ClaimStorePort: DomainPort + HealthCheckable {
    /// Point read; `PortError::NotFound` if absent
    async fn get(&self, id: ClaimId) -> Result<Claim, PortError>;

    /// Inserts a draft record, assigning its id and both timestamps
    async fn create(&self, claim: NewClaim) -> Result<ClaimId, PortError>;

    /// Merges the given fields and stamps `updatedAt`
    ///
    /// # Returns
    ///
    /// The record as stored after the merge, or `PortError::NotFound`
    async fn merge(&self, id: ClaimId, patch: ClaimPatch) -> Result<Claim, PortError>;

    /// Removes the record; deleting an absent id succeeds
    async fn delete(&self, id: ClaimId) -> Result<(), PortError>;

    /// Every claim owned by `owner_email`, in no particular order
    async fn list_by_owner(&self, owner_email: &str) -> Result<Vec<Claim>, PortError>;

    /// Every claim, in no particular order
    async fn list_all(&self) -> Result<Vec<Claim>, PortError>;

    /// Stream of committed changes
    fn subscribe(&self) -> broadcast::Receiver<ClaimEvent>;
}

/// Uploaded image bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl PhotoBlob {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn jpeg(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(bytes, "image/jpeg")
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }

    /// File extension for the object name
    pub fn extension(&self) -> &'static str {
        match self.content_type.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/png" => "png",
            "image/webp" => "webp",
            "image/heic" => "heic",
            "image/gif" => "gif",
            _ => "bin",
        }
    }
}

/// Storage of photo bytes
#[async_trait]
pub trait BlobStorePort: DomainPort {
    /// Stores `blob` under `key` and returns a durable URL for it
    async fn upload(&self, key: &str, blob: PhotoBlob) -> Result<String, PortError>;

    /// Deletes the object behind `url`; deleting a missing object succeeds
    async fn delete(&self, url: &str) -> Result<(), PortError>;

    /// Object key a URL produced by `upload` points at, if it is ours
    fn object_key(&self, url: &str) -> Option<String>;
}

/// In-memory adapters for tests and local runs
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{Clock, HealthCheckResult, SystemClock};

    /// In-memory claim store
    #[derive(Debug)]
    pub struct InMemoryClaimStore {
        claims: Arc<RwLock<HashMap<ClaimId, Claim>>>,
        clock: Arc<dyn Clock>,
        events: crate::events::ClaimEventBus,
        unavailable: AtomicBool,
    }

    impl Default for InMemoryClaimStore {
        fn default() -> Self {
            Self::with_clock(Arc::new(SystemClock))
        }
    }

    impl InMemoryClaimStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store whose timestamps come from `clock`
        pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
            Self {
                claims: Arc::new(RwLock::new(HashMap::new())),
                clock,
                events: crate::events::ClaimEventBus::default(),
                unavailable: AtomicBool::new(false),
            }
        }

        /// Resizes the change-notification channel, usually to
        /// `ClaimsConfig::event_buffer`
        pub fn with_event_buffer(mut self, capacity: usize) -> Self {
            self.events = crate::events::ClaimEventBus::new(capacity);
            self
        }

        /// Pre-populates with records as-is, timestamps included
        pub async fn with_claims(claims: Vec<Claim>) -> Self {
            let store = Self::new();
            {
                let mut map = store.claims.write().await;
                for claim in claims {
                    map.insert(claim.id, claim);
                }
            }
            store
        }

        /// Makes every subsequent call fail as if the backend were down
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        pub async fn len(&self) -> usize {
            self.claims.read().await.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.claims.read().await.is_empty()
        }

        fn check_available(&self) -> Result<(), PortError> {
            if self.unavailable.load(Ordering::SeqCst) {
                Err(PortError::unavailable("memory-claim-store"))
            } else {
                Ok(())
            }
        }
    }

    impl DomainPort for InMemoryClaimStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryClaimStore {
        async fn health_check(&self) -> HealthCheckResult {
            match self.check_available() {
                Ok(()) => HealthCheckResult::healthy("memory-claim-store", 0),
                Err(e) => HealthCheckResult::unhealthy("memory-claim-store", 0, e.to_string()),
            }
        }
    }

    #[async_trait]
    impl ClaimStorePort for InMemoryClaimStore {
        async fn get(&self, id: ClaimId) -> Result<Claim, PortError> {
            self.check_available()?;
            self.claims
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Claim", id))
        }

        async fn create(&self, claim: NewClaim) -> Result<ClaimId, PortError> {
            self.check_available()?;
            let id = ClaimId::new_v7();
            let now = self.clock.now();
            let record = claim.into_claim(id, now);
            let owner = record.owner().to_string();

            self.claims.write().await.insert(id, record);
            self.events.publish(ClaimEvent::Created {
                claim_id: id,
                owner,
                timestamp: now,
            });
            Ok(id)
        }

        async fn merge(&self, id: ClaimId, patch: ClaimPatch) -> Result<Claim, PortError> {
            self.check_available()?;
            let now = self.clock.now();
            let merged = {
                let mut claims = self.claims.write().await;
                let claim = claims
                    .get_mut(&id)
                    .ok_or_else(|| PortError::not_found("Claim", id))?;
                patch.apply(claim, now);
                claim.clone()
            };

            self.events.publish(ClaimEvent::Updated {
                claim_id: id,
                owner: merged.owner().to_string(),
                status: merged.status,
                timestamp: now,
            });
            Ok(merged)
        }

        async fn delete(&self, id: ClaimId) -> Result<(), PortError> {
            self.check_available()?;
            let removed = self.claims.write().await.remove(&id);
            if let Some(claim) = removed {
                self.events.publish(ClaimEvent::Deleted {
                    claim_id: id,
                    owner: claim.owner().to_string(),
                    timestamp: self.clock.now(),
                });
            }
            Ok(())
        }

        async fn list_by_owner(&self, owner_email: &str) -> Result<Vec<Claim>, PortError> {
            self.check_available()?;
            Ok(self
                .claims
                .read()
                .await
                .values()
                .filter(|c| c.is_owned_by(owner_email))
                .cloned()
                .collect())
        }

        async fn list_all(&self) -> Result<Vec<Claim>, PortError> {
            self.check_available()?;
            Ok(self.claims.read().await.values().cloned().collect())
        }

        fn subscribe(&self) -> broadcast::Receiver<ClaimEvent> {
            self.events.subscribe()
        }
    }

    /// In-memory blob store
    ///
    /// URLs look like `memory://blobs/{key}`.
    #[derive(Debug, Default)]
    pub struct InMemoryBlobStore {
        objects: Arc<RwLock<HashMap<String, PhotoBlob>>>,
        failing_uploads: AtomicUsize,
        failing_deletes: AtomicBool,
    }

    const BASE_URL: &str = "memory://blobs/";

    impl InMemoryBlobStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// The next `count` uploads fail
        pub fn fail_next_uploads(&self, count: usize) {
            self.failing_uploads.store(count, Ordering::SeqCst);
        }

        /// Deletes fail until switched back
        pub fn set_failing_deletes(&self, failing: bool) {
            self.failing_deletes.store(failing, Ordering::SeqCst);
        }

        /// Reads an object back through its URL
        pub async fn fetch(&self, url: &str) -> Option<PhotoBlob> {
            let key = self.object_key(url)?;
            self.objects.read().await.get(&key).cloned()
        }

        pub async fn contains(&self, url: &str) -> bool {
            self.fetch(url).await.is_some()
        }

        pub async fn len(&self) -> usize {
            self.objects.read().await.len()
        }

        pub async fn is_empty(&self) -> bool {
            self.objects.read().await.is_empty()
        }
    }

    impl DomainPort for InMemoryBlobStore {}

    #[async_trait]
    impl BlobStorePort for InMemoryBlobStore {
        async fn upload(&self, key: &str, blob: PhotoBlob) -> Result<String, PortError> {
            let should_fail = self
                .failing_uploads
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if should_fail {
                return Err(PortError::unavailable("memory-blob-store"));
            }

            self.objects.write().await.insert(key.to_string(), blob);
            Ok(format!("{}{}", BASE_URL, key))
        }

        async fn delete(&self, url: &str) -> Result<(), PortError> {
            if self.failing_deletes.load(Ordering::SeqCst) {
                return Err(PortError::unavailable("memory-blob-store"));
            }
            if let Some(key) = self.object_key(url) {
                self.objects.write().await.remove(&key);
            }
            Ok(())
        }

        fn object_key(&self, url: &str) -> Option<String> {
            url.strip_prefix(BASE_URL)
                .filter(|key| !key.is_empty())
                .map(str::to_string)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::mock::{InMemoryBlobStore, InMemoryClaimStore};
    use crate::claim::{MemberSnapshot, PhotoListChange, VehicleSnapshot};

    fn new_claim(email: &str) -> NewClaim {
        NewClaim::new(
            VehicleSnapshot::new(2020, "Honda", "Civic"),
            MemberSnapshot::new("Jane", "Doe", email),
        )
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps() {
        let store = InMemoryClaimStore::new();
        let id = store.create(new_claim("jane@x.com")).await.unwrap();

        let claim = store.get(id).await.unwrap();
        assert_eq!(claim.id, id);
        assert!(claim.is_draft());
        assert!(claim.created_at.is_some());
        assert_eq!(claim.created_at, claim.updated_at);
    }

    #[tokio::test]
    async fn test_merge_missing_claim_is_not_found() {
        let store = InMemoryClaimStore::new();
        let err = store
            .merge(ClaimId::new(), ClaimPatch::description("x"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = InMemoryClaimStore::new();
        let id = store.create(new_claim("jane@x.com")).await.unwrap();

        store.delete(id).await.unwrap();
        store.delete(id).await.unwrap();
        assert!(store.get(id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_by_owner() {
        let store = InMemoryClaimStore::new();
        store.create(new_claim("jane@x.com")).await.unwrap();
        store.create(new_claim("jane@x.com")).await.unwrap();
        store.create(new_claim("john@x.com")).await.unwrap();

        assert_eq!(store.list_by_owner("jane@x.com").await.unwrap().len(), 2);
        assert_eq!(store.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_writes_publish_events() {
        let store = InMemoryClaimStore::new();
        let mut rx = store.subscribe();

        let id = store.create(new_claim("jane@x.com")).await.unwrap();
        store
            .merge(id, ClaimPatch::photos(PhotoListChange::Append("u".into())))
            .await
            .unwrap();
        store.delete(id).await.unwrap();
        store.delete(id).await.unwrap();

        assert!(matches!(rx.recv().await.unwrap(), ClaimEvent::Created { .. }));
        assert!(matches!(rx.recv().await.unwrap(), ClaimEvent::Updated { .. }));
        assert!(matches!(rx.recv().await.unwrap(), ClaimEvent::Deleted { .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_event_buffer_bounds_unread_events() {
        let store = InMemoryClaimStore::new().with_event_buffer(2);
        let mut rx = store.subscribe();

        for _ in 0..3 {
            store.create(new_claim("jane@x.com")).await.unwrap();
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(1))
        ));
        assert!(matches!(rx.recv().await.unwrap(), ClaimEvent::Created { .. }));
    }

    #[tokio::test]
    async fn test_unavailable_store() {
        let store = InMemoryClaimStore::new();
        store.set_unavailable(true);
        let err = store.list_all().await.unwrap_err();
        assert!(err.is_transient());
        assert!(!store.health_check().await.is_healthy());
    }

    #[tokio::test]
    async fn test_blob_round_trip() {
        let blobs = InMemoryBlobStore::new();
        let url = blobs.upload("claims/a/1.jpg", PhotoBlob::jpeg(vec![1, 2])).await.unwrap();

        assert_eq!(blobs.object_key(&url).as_deref(), Some("claims/a/1.jpg"));
        assert_eq!(blobs.fetch(&url).await.unwrap().bytes, vec![1, 2]);

        blobs.delete(&url).await.unwrap();
        assert!(!blobs.contains(&url).await);
        blobs.delete(&url).await.unwrap();
    }

    #[tokio::test]
    async fn test_blob_failure_injection() {
        let blobs = InMemoryBlobStore::new();
        blobs.fail_next_uploads(1);
        assert!(blobs.upload("k", PhotoBlob::jpeg(vec![1])).await.is_err());
        assert!(blobs.upload("k", PhotoBlob::jpeg(vec![1])).await.is_ok());
    }

    #[test]
    fn test_photo_blob_extension() {
        assert_eq!(PhotoBlob::jpeg(vec![]).extension(), "jpg");
        assert_eq!(PhotoBlob::new(vec![], "IMAGE/PNG").extension(), "png");
        assert_eq!(PhotoBlob::new(vec![], "application/pdf").extension(), "bin");
        assert!(!PhotoBlob::new(vec![], "application/pdf").is_image());
    }
}
