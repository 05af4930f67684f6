//! Moderation
//!
//! Administrators see every submitted claim, narrowed and ordered with
//! [`search`], and drive the lifecycle from there.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument};

use core_kernel::ClaimId;

use crate::actor::Actor;
use crate::claim::{normalize_key, Claim, ClaimStatus};
use crate::error::ClaimError;
use crate::events::ClaimWatch;
use crate::lifecycle::LifecycleController;
use crate::ports::ClaimStorePort;

/// Which statuses a listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    InReview,
    Approved,
    Denied,
}

impl StatusFilter {
    pub fn matches(&self, status: Option<ClaimStatus>) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == Some(ClaimStatus::Pending),
            StatusFilter::InReview => status == Some(ClaimStatus::InReview),
            StatusFilter::Approved => status == Some(ClaimStatus::Approved),
            StatusFilter::Denied => status == Some(ClaimStatus::Denied),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if normalize_key(s) == "all" {
            return Ok(StatusFilter::All);
        }
        match s.parse::<ClaimStatus>() {
            Ok(ClaimStatus::Pending) => Ok(StatusFilter::Pending),
            Ok(ClaimStatus::InReview) => Ok(StatusFilter::InReview),
            Ok(ClaimStatus::Approved) => Ok(StatusFilter::Approved),
            Ok(ClaimStatus::Denied) => Ok(StatusFilter::Denied),
            Err(_) => Err(ClaimError::missing("status")),
        }
    }
}

/// Listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    Newest,
    Oldest,
    /// Largest amount first
    Amount,
}

impl FromStr for SortBy {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "newest" => Ok(SortBy::Newest),
            "oldest" => Ok(SortBy::Oldest),
            "amount" => Ok(SortBy::Amount),
            _ => Err(ClaimError::missing("sort")),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortBy::Newest => f.write_str("newest"),
            SortBy::Oldest => f.write_str("oldest"),
            SortBy::Amount => f.write_str("amount"),
        }
    }
}

/// Filter, text query and order for a claim listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub status: StatusFilter,
    pub text: String,
    pub sort: SortBy,
}

impl SearchCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_sort(mut self, sort: SortBy) -> Self {
        self.sort = sort;
        self
    }

    /// Builds criteria from optional query-string values
    pub fn parse(
        status: Option<&str>,
        text: Option<&str>,
        sort: Option<&str>,
    ) -> Result<Self, ClaimError> {
        Ok(Self {
            status: status.map(str::parse::<StatusFilter>).transpose()?.unwrap_or_default(),
            text: text.unwrap_or_default().to_string(),
            sort: sort.map(str::parse::<SortBy>).transpose()?.unwrap_or_default(),
        })
    }

    fn matches_text(&self, claim: &Claim) -> bool {
        let needle = self.text.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        let haystacks = [
            claim.member.full_name(),
            claim.member.user_email.clone(),
            claim.vehicle.describe(),
            claim.description.clone().unwrap_or_default(),
        ];
        haystacks.iter().any(|h| h.to_lowercase().contains(&needle))
    }
}

/// Filters and orders `claims`; ties keep their input order
pub fn search(claims: Vec<Claim>, criteria: &SearchCriteria) -> Vec<Claim> {
    let mut matched: Vec<Claim> = claims
        .into_iter()
        .filter(|c| criteria.status.matches(c.status) && criteria.matches_text(c))
        .collect();

    let order: fn(&Claim, &Claim) -> Ordering = match criteria.sort {
        // Claims without any timestamp go last
        SortBy::Newest => |a, b| b.sort_timestamp().cmp(&a.sort_timestamp()),
        SortBy::Oldest => |a, b| a.sort_timestamp().cmp(&b.sort_timestamp()),
        SortBy::Amount => |a, b| b.amount_or_zero().cmp(&a.amount_or_zero()),
    };
    matched.sort_by(order);
    matched
}

/// Administrator operations over all claims
#[derive(Clone)]
pub struct ModerationService {
    store: Arc<dyn ClaimStorePort>,
    lifecycle: LifecycleController,
}

impl ModerationService {
    pub fn new(store: Arc<dyn ClaimStorePort>, lifecycle: LifecycleController) -> Self {
        Self { store, lifecycle }
    }

    /// Submitted claims matching `criteria`; drafts are never listed
    #[instrument(skip(self, actor), fields(sort = %criteria.sort))]
    pub async fn review_queue(
        &self,
        actor: &Actor,
        criteria: &SearchCriteria,
    ) -> Result<Vec<Claim>, ClaimError> {
        actor.require_admin("review claims")?;
        let submitted: Vec<Claim> = self
            .store
            .list_all()
            .await?
            .into_iter()
            .filter(|c| !c.is_draft())
            .collect();

        let results = search(submitted, criteria);
        debug!(count = results.len(), "review queue listed");
        Ok(results)
    }

    pub async fn transition(
        &self,
        claim_id: ClaimId,
        target: ClaimStatus,
        actor: &Actor,
    ) -> Result<Claim, ClaimError> {
        actor.require_admin("change status")?;
        self.lifecycle.transition(claim_id, target, actor).await
    }

    pub async fn assign(
        &self,
        claim_id: ClaimId,
        provider_id: &str,
        actor: &Actor,
    ) -> Result<Claim, ClaimError> {
        self.lifecycle.assign(claim_id, provider_id, actor).await
    }

    pub async fn delete(&self, claim_id: ClaimId, actor: &Actor) -> Result<(), ClaimError> {
        self.lifecycle.delete(claim_id, actor).await
    }

    /// Every change to every claim, as it happens
    pub fn watch(&self, actor: &Actor) -> Result<ClaimWatch, ClaimError> {
        actor.require_admin("watch all claims")?;
        Ok(ClaimWatch::new(actor.clone(), self.store.subscribe()))
    }
}
