//! Resolved caller identity
//!
//! Authentication happens outside the core. Every entry point receives an
//! `Actor` that the identity layer has already resolved and trusts it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::claim::Claim;
use crate::error::ClaimError;

/// Role of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Member,
    Admin,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRole::Member => f.write_str("member"),
            ActorRole::Admin => f.write_str("admin"),
        }
    }
}

/// Who is calling
///
/// For members `identity` is the email claims are owned by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub identity: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn member(email: impl Into<String>) -> Self {
        Self {
            identity: email.into(),
            role: ActorRole::Member,
        }
    }

    pub fn admin(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            role: ActorRole::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }

    pub(crate) fn require_admin(&self, operation: &str) -> Result<(), ClaimError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ClaimError::forbidden(format!("{} requires an administrator", operation)))
        }
    }

    /// Members may only act on claims they own
    pub(crate) fn require_owner(&self, claim: &Claim) -> Result<(), ClaimError> {
        if claim.is_owned_by(&self.identity) {
            Ok(())
        } else {
            Err(ClaimError::forbidden(format!(
                "{} does not own claim {}",
                self.identity, claim.id
            )))
        }
    }
}
