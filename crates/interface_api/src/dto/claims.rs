//! Claims DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::ClaimId;
use domain_claims::{Claim, ClaimSubmission, MemberSnapshot, VehicleSnapshot};

/// Opens a draft for one of the member's vehicles
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDraftRequest {
    #[validate(range(min = 1900, max = 2100))]
    pub vehicle_year: i32,
    pub vehicle_make: String,
    pub vehicle_model: String,
    #[validate(length(max = 17))]
    pub vehicle_vin: Option<String>,
    pub user_first_name: String,
    pub user_last_name: String,
    #[validate(email)]
    pub user_email: String,
    #[validate(length(max = 32))]
    pub user_phone_number: Option<String>,
}

impl CreateDraftRequest {
    pub fn into_snapshots(self) -> (VehicleSnapshot, MemberSnapshot) {
        let mut vehicle = VehicleSnapshot::new(self.vehicle_year, self.vehicle_make, self.vehicle_model);
        vehicle.vehicle_vin = self.vehicle_vin;
        let mut member = MemberSnapshot::new(self.user_first_name, self.user_last_name, self.user_email);
        member.user_phone_number = self.user_phone_number;
        (vehicle, member)
    }
}

/// Incident details that complete a draft
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitClaimRequest {
    pub amount: Option<Decimal>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub location: Option<String>,
    #[validate(length(max = 32))]
    pub user_phone_number: Option<String>,
    pub date: NaiveDate,
    #[serde(rename = "photoURLs")]
    pub photo_urls: Option<Vec<String>>,
}

impl From<SubmitClaimRequest> for ClaimSubmission {
    fn from(request: SubmitClaimRequest) -> Self {
        let mut submission = ClaimSubmission::new(request.date);
        submission.amount = request.amount;
        submission.description = request.description;
        submission.location = request.location;
        submission.user_phone_number = request.user_phone_number;
        submission.photo_urls = request.photo_urls;
        submission
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDescriptionRequest {
    #[validate(length(max = 5000))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePhoneRequest {
    #[validate(length(max = 32))]
    pub user_phone_number: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RemovePhotoRequest {
    #[validate(length(min = 1))]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    #[validate(length(min = 1, max = 128))]
    pub assigned_to: String,
}

/// Query string of the admin review list
#[derive(Debug, Default, Deserialize)]
pub struct ReviewQuery {
    pub status: Option<String>,
    pub q: Option<String>,
    pub sort: Option<String>,
}

/// A claim as returned to clients
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    #[serde(flatten)]
    pub claim: Claim,
    /// "Draft" for unsubmitted claims, else the status name
    pub status_label: &'static str,
}

impl From<Claim> for ClaimResponse {
    fn from(claim: Claim) -> Self {
        let status_label = claim.status_label();
        Self { claim, status_label }
    }
}

#[derive(Debug, Serialize)]
pub struct DraftCreatedResponse {
    pub id: ClaimId,
}

/// Outcome of one uploaded file
#[derive(Debug, Serialize)]
pub struct PhotoUploadResult {
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PhotoUploadResponse {
    pub uploaded: usize,
    pub failed: usize,
    pub results: Vec<PhotoUploadResult>,
}

#[derive(Debug, Serialize)]
pub struct ReapResponse {
    pub reaped: usize,
}
