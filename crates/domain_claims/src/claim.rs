//! Claim record
//!
//! A claim is one member's report of an incident involving one of their
//! vehicles. The vehicle and member details are copied into the record when
//! the claim is drafted, so later edits to (or deletion of) the vehicle or
//! profile never touch an existing claim.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use core_kernel::ClaimId;

/// Claim status
///
/// Serialized with a single canonical spelling per variant. Parsing accepts
/// the legacy spellings found in stored documents (`"pending"`,
/// `"in_review"`, `"In Review"`, `"inReview"`, ...) by comparing
/// case-insensitively with separators removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ClaimStatus {
    /// Submitted, awaiting moderation
    Pending,
    /// Picked up by a moderator
    InReview,
    /// Accepted (terminal)
    Approved,
    /// Rejected (terminal)
    Denied,
}

impl ClaimStatus {
    pub const ALL: [ClaimStatus; 4] = [
        ClaimStatus::Pending,
        ClaimStatus::InReview,
        ClaimStatus::Approved,
        ClaimStatus::Denied,
    ];

    /// Canonical wire spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "Pending",
            ClaimStatus::InReview => "In Review",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Denied => "Denied",
        }
    }

    /// Approved and Denied admit no further status change
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Approved | ClaimStatus::Denied)
    }

    /// Whether the owning member may still withdraw the claim
    pub fn is_cancellable(&self) -> bool {
        matches!(self, ClaimStatus::Pending | ClaimStatus::InReview)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status string that matches none of the known spellings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown claim status: {0:?}")]
pub struct ParseStatusError(pub String);

/// Lowercases and strips everything but letters and digits
pub(crate) fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl FromStr for ClaimStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_key(s).as_str() {
            "pending" => Ok(ClaimStatus::Pending),
            "inreview" => Ok(ClaimStatus::InReview),
            "approved" => Ok(ClaimStatus::Approved),
            "denied" => Ok(ClaimStatus::Denied),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

impl TryFrom<String> for ClaimStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClaimStatus> for String {
    fn from(status: ClaimStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Vehicle details as they were when the claim was drafted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSnapshot {
    pub vehicle_year: i32,
    pub vehicle_make: String,
    pub vehicle_model: String,
    #[serde(default)]
    pub vehicle_vin: Option<String>,
}

impl VehicleSnapshot {
    pub fn new(year: i32, make: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            vehicle_year: year,
            vehicle_make: make.into(),
            vehicle_model: model.into(),
            vehicle_vin: None,
        }
    }

    pub fn with_vin(mut self, vin: impl Into<String>) -> Self {
        self.vehicle_vin = Some(vin.into());
        self
    }

    /// Human readable "year make model"
    pub fn describe(&self) -> String {
        format!("{} {} {}", self.vehicle_year, self.vehicle_make, self.vehicle_model)
    }

    /// A vehicle counts as chosen once make and model are filled in
    pub fn is_present(&self) -> bool {
        !self.vehicle_make.trim().is_empty() && !self.vehicle_model.trim().is_empty()
    }
}

/// Member contact details as they were when the claim was drafted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSnapshot {
    pub user_first_name: String,
    pub user_last_name: String,
    pub user_email: String,
    #[serde(default)]
    pub user_phone_number: Option<String>,
}

impl MemberSnapshot {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            user_first_name: first_name.into(),
            user_last_name: last_name.into(),
            user_email: email.into(),
            user_phone_number: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.user_phone_number = Some(phone.into());
        self
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.user_first_name, self.user_last_name)
    }
}

/// A claim filed by a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,
    /// Status; `None` while the claim is still a draft
    #[serde(default)]
    pub status: Option<ClaimStatus>,
    /// Vehicle snapshot
    #[serde(flatten)]
    pub vehicle: VehicleSnapshot,
    /// Member snapshot, also the ownership key
    #[serde(flatten)]
    pub member: MemberSnapshot,
    /// Deductible / damage estimate
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Free-text narrative
    #[serde(default)]
    pub description: Option<String>,
    /// Incident location
    #[serde(default)]
    pub location: Option<String>,
    /// Incident date
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Uploaded photo references, in upload order
    #[serde(rename = "photoURLs", default)]
    pub photo_urls: Vec<String>,
    /// Server-assigned creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Server-assigned time of the last write
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Service provider handling the claim
    #[serde(default)]
    pub assigned_to: Option<String>,
}

impl Claim {
    /// True until the member submits the claim
    pub fn is_draft(&self) -> bool {
        self.status.is_none()
    }

    /// Identity of the owning member
    pub fn owner(&self) -> &str {
        &self.member.user_email
    }

    /// Ownership check; emails compare case-insensitively
    pub fn is_owned_by(&self, identity: &str) -> bool {
        self.member.user_email.trim().eq_ignore_ascii_case(identity.trim())
    }

    /// Status for display and error messages
    pub fn status_label(&self) -> &'static str {
        status_label(self.status)
    }

    /// Ordering key for moderation lists: creation time, else the incident date
    pub fn sort_timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at.or_else(|| {
            self.date
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|midnight| Utc.from_utc_datetime(&midnight))
        })
    }

    /// Amount with a missing estimate counted as zero
    pub fn amount_or_zero(&self) -> Decimal {
        self.amount.unwrap_or(Decimal::ZERO)
    }
}

/// Label for an optional status, `"Draft"` when unset
pub fn status_label(status: Option<ClaimStatus>) -> &'static str {
    status.map(|s| s.as_str()).unwrap_or("Draft")
}

/// Fields of a claim at creation time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClaim {
    pub vehicle: VehicleSnapshot,
    pub member: MemberSnapshot,
}

impl NewClaim {
    pub fn new(vehicle: VehicleSnapshot, member: MemberSnapshot) -> Self {
        Self { vehicle, member }
    }

    /// Materializes the draft record a store persists
    pub fn into_claim(self, id: ClaimId, now: DateTime<Utc>) -> Claim {
        Claim {
            id,
            status: None,
            vehicle: self.vehicle,
            member: self.member,
            amount: None,
            description: None,
            location: None,
            date: None,
            photo_urls: Vec::new(),
            created_at: Some(now),
            updated_at: Some(now),
            assigned_to: None,
        }
    }
}

/// Change to the photo list, applied inside a single-record merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoListChange {
    /// Add to the end unless already present
    Append(String),
    /// Drop every occurrence
    Remove(String),
    /// Overwrite the whole list
    Replace(Vec<String>),
}

impl PhotoListChange {
    pub fn apply(&self, urls: &mut Vec<String>) {
        match self {
            PhotoListChange::Append(url) => {
                if !urls.iter().any(|u| u == url) {
                    urls.push(url.clone());
                }
            }
            PhotoListChange::Remove(url) => urls.retain(|u| u != url),
            PhotoListChange::Replace(list) => *urls = list.clone(),
        }
    }
}

/// Partial update of a claim
///
/// `None` fields are left untouched. Stores always refresh `updatedAt`,
/// even for an empty patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimPatch {
    pub status: Option<ClaimStatus>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    pub user_phone_number: Option<String>,
    pub photo_urls: Option<PhotoListChange>,
    pub assigned_to: Option<String>,
}

impl ClaimPatch {
    pub fn status(status: ClaimStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn description(text: impl Into<String>) -> Self {
        Self {
            description: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn phone(phone: impl Into<String>) -> Self {
        Self {
            user_phone_number: Some(phone.into()),
            ..Default::default()
        }
    }

    pub fn photos(change: PhotoListChange) -> Self {
        Self {
            photo_urls: Some(change),
            ..Default::default()
        }
    }

    pub fn assigned_to(provider_id: impl Into<String>) -> Self {
        Self {
            assigned_to: Some(provider_id.into()),
            ..Default::default()
        }
    }

    /// Merges the patch into `claim` and stamps `updatedAt`
    pub fn apply(&self, claim: &mut Claim, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            claim.status = Some(status);
        }
        if let Some(amount) = self.amount {
            claim.amount = Some(amount);
        }
        if let Some(ref description) = self.description {
            claim.description = Some(description.clone());
        }
        if let Some(ref location) = self.location {
            claim.location = Some(location.clone());
        }
        if let Some(date) = self.date {
            claim.date = Some(date);
        }
        if let Some(ref phone) = self.user_phone_number {
            claim.member.user_phone_number = Some(phone.clone());
        }
        if let Some(ref change) = self.photo_urls {
            change.apply(&mut claim.photo_urls);
        }
        if let Some(ref provider) = self.assigned_to {
            claim.assigned_to = Some(provider.clone());
        }
        claim.updated_at = Some(now);
    }
}
