//! Admin moderation handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use domain_claims::{Actor, ClaimStatus, SearchCriteria};

use crate::dto::claims::*;
use crate::error::ApiError;
use crate::handlers::parse_claim_id;
use crate::AppState;

/// Review list with status filter, text search and sort
pub async fn review_queue(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ReviewQuery>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let criteria = SearchCriteria::parse(
        query.status.as_deref(),
        query.q.as_deref(),
        query.sort.as_deref(),
    )?;

    let claims = state.services.moderation.review_queue(&actor, &criteria).await?;
    Ok(Json(claims.into_iter().map(ClaimResponse::from).collect()))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let id = parse_claim_id(&id)?;
    let target: ClaimStatus = request.status.parse().map_err(|_| ApiError::Validation {
        message: format!("Unknown status: {}", request.status),
        fields: vec!["status".to_string()],
    })?;

    let claim = state.services.moderation.transition(id, target, &actor).await?;
    Ok(Json(claim.into()))
}

pub async fn assign_provider(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let id = parse_claim_id(&id)?;
    request.validate()?;

    let claim = state
        .services
        .moderation
        .assign(id, &request.assigned_to, &actor)
        .await?;
    Ok(Json(claim.into()))
}

/// Removes a claim and its photos; deleting twice succeeds
pub async fn delete_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_claim_id(&id)?;
    state.services.moderation.delete(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reap_drafts(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ReapResponse>, ApiError> {
    let reaped = state.services.authoring.reap_abandoned_drafts(&actor).await?;
    Ok(Json(ReapResponse { reaped }))
}
