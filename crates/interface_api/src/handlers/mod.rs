//! Request handlers

pub mod admin;
pub mod claims;
pub mod health;

use core_kernel::ClaimId;

use crate::error::ApiError;

/// Parses a claim id path segment, with or without the `CLM-` prefix
pub(crate) fn parse_claim_id(raw: &str) -> Result<ClaimId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Malformed claim id: {}", raw)))
}
