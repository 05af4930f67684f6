//! Claims domain errors

use thiserror::Error;

use core_kernel::PortError;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    /// Required fields missing or malformed; names every offending field
    #[error("Missing or invalid fields: {}", .fields.join(", "))]
    Validation { fields: Vec<String> },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Claim not found: {0}")]
    ClaimNotFound(String),

    /// The actor lacks the role or ownership the operation needs
    #[error("Not permitted: {0}")]
    Forbidden(String),

    #[error("Photo limit of {0} reached")]
    PhotoLimitReached(usize),

    /// Store or blob storage failure
    #[error("Backend failure: {0}")]
    Transport(#[source] PortError),
}

impl ClaimError {
    /// Creates a Validation error for a single field
    pub fn missing(field: impl Into<String>) -> Self {
        ClaimError::Validation {
            fields: vec![field.into()],
        }
    }

    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        ClaimError::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn not_found(id: impl std::fmt::Display) -> Self {
        ClaimError::ClaimNotFound(id.to_string())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ClaimError::Forbidden(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClaimError::ClaimNotFound(_))
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, ClaimError::InvalidTransition { .. })
    }

    /// Message suitable for showing to the person who triggered the action
    pub fn user_message(&self) -> String {
        match self {
            ClaimError::Validation { fields } => {
                format!("Please fill in: {}", fields.join(", "))
            }
            ClaimError::InvalidTransition { from, .. } if from == "Approved" || from == "Denied" => {
                "This claim has already been processed and can no longer be changed or cancelled".to_string()
            }
            ClaimError::InvalidTransition { from, to } => {
                format!("A claim that is {} cannot be moved to {}", from, to)
            }
            ClaimError::ClaimNotFound(_) => "This claim no longer exists".to_string(),
            ClaimError::Forbidden(_) => "You are not allowed to do that".to_string(),
            ClaimError::PhotoLimitReached(max) => {
                format!("A claim can have at most {} photos", max)
            }
            ClaimError::Transport(_) => "Something went wrong, please try again".to_string(),
        }
    }
}

impl From<PortError> for ClaimError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { id, .. } => ClaimError::ClaimNotFound(id),
            PortError::Validation { field: Some(field), .. } => ClaimError::Validation {
                fields: vec![field],
            },
            PortError::Validation { message, field: None } => ClaimError::Validation {
                fields: vec![message],
            },
            other => ClaimError::Transport(other),
        }
    }
}
