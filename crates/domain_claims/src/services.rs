//! Wiring of the claims services over one store and one blob store

use std::sync::Arc;

use core_kernel::{Clock, HealthCheckResult, SystemClock};

use crate::authoring::AuthoringWorkflow;
use crate::config::ClaimsConfig;
use crate::lifecycle::LifecycleController;
use crate::moderation::ModerationService;
use crate::photos::PhotoAttachmentManager;
use crate::ports::{BlobStorePort, ClaimStorePort};
use crate::self_service::MemberSelfService;

/// All claims services sharing the same adapters
#[derive(Clone)]
pub struct ClaimServices {
    pub authoring: AuthoringWorkflow,
    pub moderation: ModerationService,
    pub self_service: MemberSelfService,
    pub lifecycle: LifecycleController,
    pub photos: PhotoAttachmentManager,
    store: Arc<dyn ClaimStorePort>,
}

impl ClaimServices {
    pub fn new(
        store: Arc<dyn ClaimStorePort>,
        blobs: Arc<dyn BlobStorePort>,
        config: ClaimsConfig,
    ) -> Self {
        Self::with_clock(store, blobs, config, Arc::new(SystemClock))
    }

    /// Same as `new`, with the reaper's notion of "now" injected
    pub fn with_clock(
        store: Arc<dyn ClaimStorePort>,
        blobs: Arc<dyn BlobStorePort>,
        config: ClaimsConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let config = Arc::new(config);
        let photos = PhotoAttachmentManager::new(store.clone(), blobs, config.clone());
        let lifecycle = LifecycleController::new(store.clone(), photos.clone());
        let authoring = AuthoringWorkflow::new(
            store.clone(),
            lifecycle.clone(),
            photos.clone(),
            clock,
            config,
        );
        let moderation = ModerationService::new(store.clone(), lifecycle.clone());
        let self_service = MemberSelfService::new(store.clone(), lifecycle.clone(), photos.clone());

        Self {
            authoring,
            moderation,
            self_service,
            lifecycle,
            photos,
            store,
        }
    }

    /// Health of the claim store
    pub async fn health_check(&self) -> HealthCheckResult {
        self.store.health_check().await
    }
}
