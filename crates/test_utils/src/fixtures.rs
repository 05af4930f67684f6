//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the claims crates. These fixtures are
//! designed to be consistent and predictable: Jane Doe owns a 2020 Honda
//! Civic, John Roe owns a 2018 Toyota Corolla.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use core_kernel::{ClaimId, ManualClock};
use domain_claims::ports::mock::{InMemoryBlobStore, InMemoryClaimStore};
use domain_claims::{
    Actor, ClaimServices, ClaimSubmission, ClaimsConfig, MemberSnapshot, PhotoBlob,
    VehicleSnapshot,
};
use rust_decimal_macros::dec;

/// Fixture for vehicle snapshots
pub struct VehicleFixtures;

impl VehicleFixtures {
    pub fn civic() -> VehicleSnapshot {
        VehicleSnapshot::new(2020, "Honda", "Civic").with_vin("2HGFC2F59LH000001")
    }

    pub fn corolla() -> VehicleSnapshot {
        VehicleSnapshot::new(2018, "Toyota", "Corolla")
    }
}

/// Fixture for member snapshots and the actors they map to
pub struct MemberFixtures;

impl MemberFixtures {
    pub fn jane() -> MemberSnapshot {
        MemberSnapshot::new("Jane", "Doe", "jane@x.com")
    }

    pub fn john() -> MemberSnapshot {
        MemberSnapshot::new("John", "Roe", "john@x.com")
    }

    pub fn jane_actor() -> Actor {
        Actor::member("jane@x.com")
    }

    pub fn john_actor() -> Actor {
        Actor::member("john@x.com")
    }

    pub fn admin() -> Actor {
        Actor::admin("admin-1")
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Start of every harness clock (Jan 1, 2024 09:00 UTC)
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    /// Standard incident date
    pub fn incident_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }
}

/// Fixture for submission payloads
pub struct SubmissionFixtures;

impl SubmissionFixtures {
    /// The rear-end collision used throughout the suites
    pub fn rear_ended() -> ClaimSubmission {
        ClaimSubmission::new(TemporalFixtures::incident_date())
            .with_amount(dec!(500))
            .with_description("Rear-ended")
            .with_phone("555-1111")
    }

    /// A submission with nothing but the incident date
    pub fn empty() -> ClaimSubmission {
        ClaimSubmission::new(TemporalFixtures::incident_date())
    }
}

/// Fixture for photo uploads
pub struct PhotoFixtures;

impl PhotoFixtures {
    /// A small JPEG whose bytes differ per `seed`
    pub fn jpeg(seed: u8) -> PhotoBlob {
        PhotoBlob::jpeg(vec![0xFF, 0xD8, seed, 0xFF, 0xD9])
    }

    pub fn png(seed: u8) -> PhotoBlob {
        PhotoBlob::new(vec![0x89, 0x50, seed], "image/png")
    }

    pub fn not_an_image() -> PhotoBlob {
        PhotoBlob::new(b"%PDF-1.7".to_vec(), "application/pdf")
    }
}

/// Claims services over in-memory adapters and a ticking clock
///
/// Every store write advances the clock by one minute, so records created in
/// sequence have strictly increasing timestamps.
pub struct ClaimsHarness {
    pub store: Arc<InMemoryClaimStore>,
    pub blobs: Arc<InMemoryBlobStore>,
    pub clock: Arc<ManualClock>,
    pub services: ClaimServices,
}

impl Default for ClaimsHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimsHarness {
    pub fn new() -> Self {
        Self::with_config(ClaimsConfig::default())
    }

    pub fn with_config(config: ClaimsConfig) -> Self {
        let clock = Arc::new(ManualClock::ticking(TemporalFixtures::epoch(), Duration::minutes(1)));
        let store = Arc::new(
            InMemoryClaimStore::with_clock(clock.clone()).with_event_buffer(config.event_buffer),
        );
        let blobs = Arc::new(InMemoryBlobStore::new());
        let services = ClaimServices::with_clock(store.clone(), blobs.clone(), config, clock.clone());
        Self { store, blobs, clock, services }
    }

    /// Drafts a claim for Jane's Civic
    pub async fn jane_draft(&self) -> ClaimId {
        self.services
            .authoring
            .draft(VehicleFixtures::civic(), MemberFixtures::jane(), &MemberFixtures::jane_actor())
            .await
            .unwrap()
    }

    /// Drafts and submits Jane's rear-end claim
    pub async fn jane_submitted(&self) -> ClaimId {
        let id = self.jane_draft().await;
        self.services
            .authoring
            .submit(id, SubmissionFixtures::rear_ended(), &MemberFixtures::jane_actor())
            .await
            .unwrap();
        id
    }

    /// Drafts and submits a claim for John's Corolla
    pub async fn john_submitted(&self, description: &str) -> ClaimId {
        let john = MemberFixtures::john_actor();
        let id = self
            .services
            .authoring
            .draft(VehicleFixtures::corolla(), MemberFixtures::john(), &john)
            .await
            .unwrap();
        self.services
            .authoring
            .submit(
                id,
                SubmissionFixtures::rear_ended().with_description(description),
                &john,
            )
            .await
            .unwrap();
        id
    }
}
