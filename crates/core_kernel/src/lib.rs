//! Core Kernel - Foundational types shared by the claims crates
//!
//! This crate provides the building blocks used across the workspace:
//! - Strongly-typed identifiers
//! - Port error and health-check abstractions for adapters
//! - A clock abstraction for server-assigned timestamps

pub mod identifiers;
pub mod ports;
pub mod temporal;

pub use identifiers::{ClaimId, PhotoId};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
pub use temporal::{Clock, SystemClock, ManualClock};
