//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! claims test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built vehicles, members, submissions and an in-memory harness
//! - `builders`: Builder for claim records with sensible defaults
//! - `database`: PostgreSQL test containers with the claims schema applied
//! - `assertions`: Custom assertion helpers for claims and claim errors
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
