//! Infrastructure Database Layer
//!
//! This crate provides the PostgreSQL persistence for roadside assistance
//! claims using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: `ClaimsRepository` owns the SQL,
//! `PostgresClaimStore` adapts it to the domain's `ClaimStorePort`.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, PostgresClaimStore, DatabaseConfig};
//!
//! let pool = create_pool(DatabaseConfig::default()).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresClaimStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use repositories::{ClaimRow, ClaimsRepository};
pub use adapters::PostgresClaimStore;
