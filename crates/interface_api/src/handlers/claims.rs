//! Member claim handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;
use validator::Validate;

use domain_claims::{Actor, PhotoBlob};

use crate::dto::claims::*;
use crate::error::ApiError;
use crate::handlers::parse_claim_id;
use crate::AppState;

/// Opens a draft
pub async fn create_draft(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateDraftRequest>,
) -> Result<(StatusCode, Json<DraftCreatedResponse>), ApiError> {
    request.validate()?;
    let (vehicle, member) = request.into_snapshots();

    let id = state.services.authoring.draft(vehicle, member, &actor).await?;
    Ok((StatusCode::CREATED, Json(DraftCreatedResponse { id })))
}

/// Submits a draft for review
pub async fn submit_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(request): Json<SubmitClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let id = parse_claim_id(&id)?;
    request.validate()?;

    let claim = state.services.authoring.submit(id, request.into(), &actor).await?;
    Ok(Json(claim.into()))
}

/// Drops an unsubmitted draft
pub async fn discard_draft(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_claim_id(&id)?;
    state.services.authoring.discard_draft(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Lists the caller's claims, newest first
pub async fn list_my_claims(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let claims = state.services.self_service.my_claims(&actor).await?;
    Ok(Json(claims.into_iter().map(ClaimResponse::from).collect()))
}

/// Gets one of the caller's claims
pub async fn get_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let id = parse_claim_id(&id)?;
    let claim = state.services.self_service.view(id, &actor).await?;
    Ok(Json(claim.into()))
}

pub async fn update_description(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(request): Json<UpdateDescriptionRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let id = parse_claim_id(&id)?;
    request.validate()?;

    let claim = state
        .services
        .self_service
        .update_description(id, &request.description, &actor)
        .await?;
    Ok(Json(claim.into()))
}

pub async fn update_phone(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(request): Json<UpdatePhoneRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let id = parse_claim_id(&id)?;
    request.validate()?;

    let claim = state
        .services
        .self_service
        .update_contact_phone(id, &request.user_phone_number, &actor)
        .await?;
    Ok(Json(claim.into()))
}

/// Uploads every file part of a multipart body as a photo
///
/// Files are attached one by one. The response lists each file's URL or
/// error; earlier successes stay attached when a later file fails.
pub async fn upload_photos(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<PhotoUploadResponse>, ApiError> {
    let id = parse_claim_id(&id)?;

    let mut filenames = Vec::new();
    let mut blobs = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.file_name().is_none() {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await?;

        filenames.push(filename);
        blobs.push(PhotoBlob::new(bytes.to_vec(), content_type));
    }
    if blobs.is_empty() {
        return Err(ApiError::Validation {
            message: "Please attach at least one photo".to_string(),
            fields: vec!["photos".to_string()],
        });
    }

    let outcomes = state.services.self_service.add_photos(id, blobs, &actor).await?;

    let results: Vec<PhotoUploadResult> = filenames
        .into_iter()
        .zip(outcomes)
        .map(|(filename, outcome)| match outcome {
            Ok(url) => PhotoUploadResult { filename, url: Some(url), error: None },
            Err(e) => PhotoUploadResult { filename, url: None, error: Some(e.user_message()) },
        })
        .collect();
    let uploaded = results.iter().filter(|r| r.url.is_some()).count();
    info!(claim_id = %id, uploaded, failed = results.len() - uploaded, "photos uploaded");

    Ok(Json(PhotoUploadResponse {
        uploaded,
        failed: results.len() - uploaded,
        results,
    }))
}

pub async fn remove_photo(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(request): Json<RemovePhotoRequest>,
) -> Result<StatusCode, ApiError> {
    let id = parse_claim_id(&id)?;
    request.validate()?;

    state.services.self_service.remove_photo(id, &request.url, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cancels a claim that has not been decided yet
pub async fn cancel_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_claim_id(&id)?;
    state.services.self_service.cancel(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}
