//! Test Data Builders
//!
//! Provides a builder for claim records with sensible defaults, for tests of
//! pure functions (search, sorting, serialization) that need records in a
//! given shape without going through the services.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use core_kernel::ClaimId;
use domain_claims::{Claim, ClaimStatus, MemberSnapshot, NewClaim, VehicleSnapshot};
use rust_decimal::Decimal;

use crate::fixtures::{MemberFixtures, TemporalFixtures, VehicleFixtures};

/// Builder for constructing claim records
pub struct ClaimBuilder {
    claim: Claim,
}

impl Default for ClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimBuilder {
    /// Jane's Civic, submitted and pending, created at the fixture epoch
    pub fn new() -> Self {
        let mut claim = NewClaim::new(VehicleFixtures::civic(), MemberFixtures::jane())
            .into_claim(ClaimId::new(), TemporalFixtures::epoch());
        claim.status = Some(ClaimStatus::Pending);
        Self { claim }
    }

    /// Starts from an unsubmitted draft
    pub fn draft() -> Self {
        let mut builder = Self::new();
        builder.claim.status = None;
        builder
    }

    pub fn with_status(mut self, status: ClaimStatus) -> Self {
        self.claim.status = Some(status);
        self
    }

    pub fn with_vehicle(mut self, vehicle: VehicleSnapshot) -> Self {
        self.claim.vehicle = vehicle;
        self
    }

    pub fn with_member(mut self, member: MemberSnapshot) -> Self {
        self.claim.member = member;
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.claim.amount = Some(amount);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.claim.description = Some(description.into());
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.claim.date = Some(date);
        self
    }

    /// Sets both timestamps
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.claim.created_at = Some(at);
        self.claim.updated_at = Some(at);
        self
    }

    /// Creation time offset from the fixture epoch
    pub fn created_minutes_after_epoch(self, minutes: i64) -> Self {
        self.created_at(TemporalFixtures::epoch() + Duration::minutes(minutes))
    }

    /// A legacy record with no server timestamps
    pub fn without_timestamps(mut self) -> Self {
        self.claim.created_at = None;
        self.claim.updated_at = None;
        self
    }

    pub fn with_photo(mut self, url: impl Into<String>) -> Self {
        self.claim.photo_urls.push(url.into());
        self
    }

    pub fn assigned_to(mut self, provider_id: impl Into<String>) -> Self {
        self.claim.assigned_to = Some(provider_id.into());
        self
    }

    pub fn build(self) -> Claim {
        self.claim
    }
}
