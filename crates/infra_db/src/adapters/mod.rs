//! Domain Adapters
//!
//! This module provides adapter implementations for domain ports,
//! connecting domain interfaces to the PostgreSQL database layer.
//!
//! # Architecture
//!
//! Each adapter:
//! - Implements the domain's port trait
//! - Translates between domain models and database row types
//! - Uses the repository layer for database operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresClaimStore;
//! use domain_claims::ClaimStorePort;
//!
//! let store = PostgresClaimStore::new(pool);
//! let claims = store.list_by_owner("jane@x.com").await?;
//! ```

pub mod claims;

pub use claims::PostgresClaimStore;
