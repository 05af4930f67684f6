//! Repository implementations for domain entities
//!
//! Repositories encapsulate SQL queries and map between database rows and
//! domain types. Partial updates are single statements so concurrent writers
//! never lose each other's fields.

pub mod claims;

pub use claims::{ClaimRow, ClaimsRepository};
