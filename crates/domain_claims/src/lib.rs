//! Roadside Claims Domain
//!
//! This crate implements the claim lifecycle of the membership portal: a
//! member drafts a claim for one of their vehicles, attaches photos, submits
//! it, and administrators move it to a decision.
//!
//! # Claim Lifecycle
//!
//! ```text
//! Draft -> Pending -> In Review -> Approved/Denied
//!            \            \
//!             +------------+--> Cancelled by the member (deleted)
//! ```
//!
//! Administrators may decide straight from `Pending` and may delete a claim
//! in any state.

pub mod actor;
pub mod authoring;
pub mod claim;
pub mod config;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod moderation;
pub mod photos;
pub mod ports;
pub mod self_service;
pub mod services;

pub use actor::{Actor, ActorRole};
pub use authoring::{AuthoringWorkflow, ClaimSubmission};
pub use claim::{
    Claim, ClaimPatch, ClaimStatus, MemberSnapshot, NewClaim, ParseStatusError, PhotoListChange,
    VehicleSnapshot,
};
pub use config::ClaimsConfig;
pub use error::ClaimError;
pub use events::{ClaimEvent, ClaimEventBus, ClaimWatch};
pub use lifecycle::LifecycleController;
pub use moderation::{search, ModerationService, SearchCriteria, SortBy, StatusFilter};
pub use photos::PhotoAttachmentManager;
pub use ports::{BlobStorePort, ClaimStorePort, PhotoBlob};
pub use self_service::MemberSelfService;
pub use services::ClaimServices;
