//! Custom Test Assertions
//!
//! Provides assertion helpers for claims and claim errors that give more
//! meaningful failure messages than a bare `matches!`.

use domain_claims::{Claim, ClaimError, ClaimStatus};

/// Asserts that a claim has been submitted and is in `expected`
pub fn assert_status(claim: &Claim, expected: ClaimStatus) {
    assert_eq!(
        claim.status,
        Some(expected),
        "Expected claim {} to be {}, but it is {}",
        claim.id,
        expected,
        claim.status_label()
    );
}

/// Asserts that an error is a validation error naming exactly `fields`
pub fn assert_validation_fields(err: &ClaimError, fields: &[&str]) {
    match err {
        ClaimError::Validation { fields: actual } => assert_eq!(
            actual, fields,
            "Validation error names the wrong fields"
        ),
        other => panic!("Expected a validation error for {:?}, got {:?}", fields, other),
    }
}

/// Asserts that an error is a rejected status transition
pub fn assert_invalid_transition(err: &ClaimError) {
    assert!(
        err.is_invalid_transition(),
        "Expected an invalid transition, got {:?}",
        err
    );
}

/// Asserts that an error reports a missing claim
pub fn assert_claim_not_found(err: &ClaimError) {
    assert!(err.is_not_found(), "Expected claim not found, got {:?}", err);
}

/// Asserts that an error is an authorization refusal
pub fn assert_forbidden(err: &ClaimError) {
    assert!(
        matches!(err, ClaimError::Forbidden(_)),
        "Expected forbidden, got {:?}",
        err
    );
}

/// Asserts that claims are ordered newest first, undated claims last
pub fn assert_newest_first(claims: &[Claim]) {
    for pair in claims.windows(2) {
        assert!(
            pair[0].sort_timestamp() >= pair[1].sort_timestamp(),
            "Claims out of order: {} ({:?}) before {} ({:?})",
            pair[0].id,
            pair[0].sort_timestamp(),
            pair[1].id,
            pair[1].sort_timestamp()
        );
    }
}
