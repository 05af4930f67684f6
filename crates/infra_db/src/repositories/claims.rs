//! Claims repository implementation
//!
//! This module provides database access for claim records. Queries are
//! built at runtime with `sqlx::query_as` so the crate builds without a live
//! database; the row type is mapped with `FromRow`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use core_kernel::ClaimId;
use domain_claims::{
    Claim, ClaimPatch, ClaimStatus, MemberSnapshot, NewClaim, PhotoListChange, VehicleSnapshot,
};

use crate::error::DatabaseError;

/// Columns selected for every claim read
const CLAIM_COLUMNS: &str = "claim_id, status, vehicle_year, vehicle_make, vehicle_model, \
    vehicle_vin, user_first_name, user_last_name, user_email, user_phone_number, amount, \
    description, location, incident_date, photo_urls, assigned_to, created_at, updated_at";

/// A row of the `claims` table
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ClaimRow {
    pub claim_id: Uuid,
    pub status: Option<String>,
    pub vehicle_year: i32,
    pub vehicle_make: String,
    pub vehicle_model: String,
    pub vehicle_vin: Option<String>,
    pub user_first_name: String,
    pub user_last_name: String,
    pub user_email: String,
    pub user_phone_number: Option<String>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub incident_date: Option<NaiveDate>,
    pub photo_urls: Vec<String>,
    pub assigned_to: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClaimRow {
    /// Converts the row into the domain record
    ///
    /// Status spellings are normalised; an unknown status is a
    /// `SerializationError`.
    pub fn into_claim(self) -> Result<Claim, DatabaseError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<ClaimStatus>)
            .transpose()
            .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

        let mut vehicle = VehicleSnapshot::new(self.vehicle_year, self.vehicle_make, self.vehicle_model);
        vehicle.vehicle_vin = self.vehicle_vin;
        let mut member = MemberSnapshot::new(self.user_first_name, self.user_last_name, self.user_email);
        member.user_phone_number = self.user_phone_number;

        Ok(Claim {
            id: ClaimId::from_uuid(self.claim_id),
            status,
            vehicle,
            member,
            amount: self.amount,
            description: self.description,
            location: self.location,
            date: self.incident_date,
            photo_urls: self.photo_urls,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
            assigned_to: self.assigned_to,
        })
    }
}

/// Repository for claim records
#[derive(Debug, Clone)]
pub struct ClaimsRepository {
    pool: PgPool,
}

impl ClaimsRepository {
    /// Creates a new ClaimsRepository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Retrieves a claim by its identifier
    ///
    /// # Returns
    ///
    /// The claim row or NotFound error
    pub async fn get_by_id(&self, claim_id: Uuid) -> Result<ClaimRow, DatabaseError> {
        let sql = format!("SELECT {} FROM claims WHERE claim_id = $1", CLAIM_COLUMNS);
        sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Claim", ClaimId::from_uuid(claim_id)))
    }

    /// Inserts a draft; both timestamps come from the database clock
    pub async fn insert_draft(&self, claim_id: Uuid, claim: &NewClaim) -> Result<ClaimRow, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO claims (
                claim_id, vehicle_year, vehicle_make, vehicle_model, vehicle_vin,
                user_first_name, user_last_name, user_email, user_phone_number
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            CLAIM_COLUMNS
        );

        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim_id)
            .bind(claim.vehicle.vehicle_year)
            .bind(&claim.vehicle.vehicle_make)
            .bind(&claim.vehicle.vehicle_model)
            .bind(&claim.vehicle.vehicle_vin)
            .bind(&claim.member.user_first_name)
            .bind(&claim.member.user_last_name)
            .bind(claim.member.user_email.trim())
            .bind(&claim.member.user_phone_number)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    /// Applies a partial update in a single statement
    ///
    /// Photo list changes use `array_append`/`array_remove` so concurrent
    /// photo edits on the same claim do not overwrite each other.
    pub async fn merge(&self, claim_id: Uuid, patch: &ClaimPatch) -> Result<ClaimRow, DatabaseError> {
        let mut query = build_merge(claim_id, patch);
        query
            .build_query_as::<ClaimRow>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Claim", ClaimId::from_uuid(claim_id)))
    }

    /// Deletes a claim, returning the owner's email if a row was removed
    pub async fn delete(&self, claim_id: Uuid) -> Result<Option<String>, DatabaseError> {
        let owner = sqlx::query_scalar::<_, String>(
            "DELETE FROM claims WHERE claim_id = $1 RETURNING user_email",
        )
        .bind(claim_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner)
    }

    /// Retrieves every claim owned by `email`, compared case-insensitively
    pub async fn find_by_owner(&self, email: &str) -> Result<Vec<ClaimRow>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM claims WHERE lower(user_email) = lower($1)",
            CLAIM_COLUMNS
        );
        let rows = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(email.trim())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Retrieves every claim
    pub async fn find_all(&self) -> Result<Vec<ClaimRow>, DatabaseError> {
        let sql = format!("SELECT {} FROM claims", CLAIM_COLUMNS);
        let rows = sqlx::query_as::<_, ClaimRow>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

/// Builds the `UPDATE ... RETURNING` statement for a patch
///
/// `updated_at` is always refreshed, even for an empty patch.
pub(crate) fn build_merge(claim_id: Uuid, patch: &ClaimPatch) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::<Postgres>::new("UPDATE claims SET updated_at = now()");

    if let Some(status) = patch.status {
        query.push(", status = ").push_bind(status.as_str());
    }
    if let Some(amount) = patch.amount {
        query.push(", amount = ").push_bind(amount);
    }
    if let Some(ref description) = patch.description {
        query.push(", description = ").push_bind(description.clone());
    }
    if let Some(ref location) = patch.location {
        query.push(", location = ").push_bind(location.clone());
    }
    if let Some(date) = patch.date {
        query.push(", incident_date = ").push_bind(date);
    }
    if let Some(ref phone) = patch.user_phone_number {
        query.push(", user_phone_number = ").push_bind(phone.clone());
    }
    if let Some(ref provider) = patch.assigned_to {
        query.push(", assigned_to = ").push_bind(provider.clone());
    }
    match patch.photo_urls {
        Some(PhotoListChange::Append(ref url)) => {
            query
                .push(", photo_urls = CASE WHEN ")
                .push_bind(url.clone())
                .push(" = ANY(photo_urls) THEN photo_urls ELSE array_append(photo_urls, ")
                .push_bind(url.clone())
                .push(") END");
        }
        Some(PhotoListChange::Remove(ref url)) => {
            query
                .push(", photo_urls = array_remove(photo_urls, ")
                .push_bind(url.clone())
                .push(")");
        }
        Some(PhotoListChange::Replace(ref urls)) => {
            query.push(", photo_urls = ").push_bind(urls.clone());
        }
        None => {}
    }

    query
        .push(" WHERE claim_id = ")
        .push_bind(claim_id)
        .push(" RETURNING ")
        .push(CLAIM_COLUMNS);
    query
}
