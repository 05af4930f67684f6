//! PostgreSQL Claim Store Adapter
//!
//! This module provides the database adapter for the claims domain,
//! implementing the `ClaimStorePort` trait on top of `ClaimsRepository`.
//!
//! # Overview
//!
//! The `PostgresClaimStore`:
//!
//! - Translates port calls into repository operations
//! - Converts database rows back into domain records
//! - Publishes a `ClaimEvent` after every committed write
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresClaimStore;
//! use domain_claims::ClaimStorePort;
//! use std::sync::Arc;
//!
//! let store: Arc<dyn ClaimStorePort> = Arc::new(PostgresClaimStore::new(pool));
//! let claim = store.get(claim_id).await?;
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use core_kernel::{ClaimId, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_claims::{
    Claim, ClaimEvent, ClaimEventBus, ClaimPatch, ClaimStorePort, ClaimsConfig, NewClaim,
};

use crate::repositories::claims::{ClaimRow, ClaimsRepository};

const ADAPTER_ID: &str = "postgres-claim-store";

/// PostgreSQL-backed implementation of `ClaimStorePort`
///
/// # Change notifications
///
/// Events are fanned out in-process. Subscribers only see writes made
/// through this instance.
// TODO: relay events through LISTEN/NOTIFY once the API runs as more than one instance
#[derive(Debug, Clone)]
pub struct PostgresClaimStore {
    repository: ClaimsRepository,
    events: ClaimEventBus,
}

impl PostgresClaimStore {
    /// Creates a store with the default notification buffer
    pub fn new(pool: PgPool) -> Self {
        Self::with_event_buffer(pool, ClaimsConfig::default().event_buffer)
    }

    /// Creates a store whose notification channel holds `capacity` events
    pub fn with_event_buffer(pool: PgPool, capacity: usize) -> Self {
        Self {
            repository: ClaimsRepository::new(pool),
            events: ClaimEventBus::new(capacity),
        }
    }

    /// Returns a reference to the underlying repository
    pub fn repository(&self) -> &ClaimsRepository {
        &self.repository
    }
}

// Mark as a domain port
impl DomainPort for PostgresClaimStore {}

#[async_trait]
impl HealthCheckable for PostgresClaimStore {
    /// Performs a simple SELECT 1 to verify the pool is operational
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(self.repository.pool())
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy(ADAPTER_ID, latency_ms),
            Err(e) => HealthCheckResult::unhealthy(
                ADAPTER_ID,
                latency_ms,
                format!("Database error: {}", e),
            ),
        }
    }
}

#[async_trait]
impl ClaimStorePort for PostgresClaimStore {
    #[instrument(skip(self), fields(claim_id = %id))]
    async fn get(&self, id: ClaimId) -> Result<Claim, PortError> {
        debug!("Fetching claim by ID");
        let row = self.repository.get_by_id(*id.as_uuid()).await?;
        Ok(row.into_claim()?)
    }

    #[instrument(skip(self, claim), fields(owner = %claim.member.user_email))]
    async fn create(&self, claim: NewClaim) -> Result<ClaimId, PortError> {
        let id = ClaimId::new_v7();
        let row = self.repository.insert_draft(*id.as_uuid(), &claim).await?;
        debug!(claim_id = %id, "Claim draft inserted");

        self.events.publish(ClaimEvent::Created {
            claim_id: id,
            owner: row.user_email,
            timestamp: row.created_at,
        });
        Ok(id)
    }

    #[instrument(skip(self, patch), fields(claim_id = %id))]
    async fn merge(&self, id: ClaimId, patch: ClaimPatch) -> Result<Claim, PortError> {
        let row = self.repository.merge(*id.as_uuid(), &patch).await?;
        let claim = row.into_claim()?;

        self.events.publish(ClaimEvent::Updated {
            claim_id: id,
            owner: claim.owner().to_string(),
            status: claim.status,
            timestamp: claim.updated_at.unwrap_or_else(Utc::now),
        });
        Ok(claim)
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    async fn delete(&self, id: ClaimId) -> Result<(), PortError> {
        if let Some(owner) = self.repository.delete(*id.as_uuid()).await? {
            debug!("Claim deleted");
            self.events.publish(ClaimEvent::Deleted {
                claim_id: id,
                owner,
                timestamp: Utc::now(),
            });
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_by_owner(&self, owner_email: &str) -> Result<Vec<Claim>, PortError> {
        rows_to_claims(self.repository.find_by_owner(owner_email).await?)
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Claim>, PortError> {
        rows_to_claims(self.repository.find_all().await?)
    }

    fn subscribe(&self) -> broadcast::Receiver<ClaimEvent> {
        self.events.subscribe()
    }
}

fn rows_to_claims(rows: Vec<ClaimRow>) -> Result<Vec<Claim>, PortError> {
    rows.into_iter()
        .map(|row| row.into_claim().map_err(PortError::from))
        .collect()
}
