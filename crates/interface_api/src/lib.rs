//! HTTP API Layer
//!
//! This crate provides the REST API for the roadside claims portal using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: member, admin and health endpoints
//! - **Middleware**: JWT identity resolution, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Domain errors mapped to status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(services, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    Router,
    routing::{delete, get, post, put},
    middleware as axum_middleware,
};
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use core_kernel::HealthCheckable;
use domain_claims::ClaimServices;

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, audit_middleware};
use crate::handlers::{admin, claims, health};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub services: ClaimServices,
    pub config: Arc<ApiConfig>,
    /// Photo storage health check for readiness
    pub blob_health: Option<Arc<dyn HealthCheckable>>,
}

impl AppState {
    pub fn new(services: ClaimServices, config: ApiConfig) -> Self {
        Self {
            services,
            config: Arc::new(config),
            blob_health: None,
        }
    }

    pub fn with_blob_health(mut self, check: Arc<dyn HealthCheckable>) -> Self {
        self.blob_health = Some(check);
        self
    }
}

/// Creates the main API router
///
/// # Arguments
///
/// * `state` - Claims services and configuration
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Member routes
    let claims_routes = Router::new()
        .route("/", post(claims::create_draft).get(claims::list_my_claims))
        .route("/:id", get(claims::get_claim))
        .route("/:id/submit", post(claims::submit_claim))
        .route("/:id/description", put(claims::update_description))
        .route("/:id/phone", put(claims::update_phone))
        .route(
            "/:id/photos",
            post(claims::upload_photos)
                .delete(claims::remove_photo)
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .route("/:id/cancel", post(claims::cancel_claim))
        .route("/:id/draft", delete(claims::discard_draft));

    // Admin routes
    let admin_routes = Router::new()
        .route("/claims", get(admin::review_queue))
        .route("/claims/:id", delete(admin::delete_claim))
        .route("/claims/:id/status", put(admin::update_status))
        .route("/claims/:id/assignment", put(admin::assign_provider))
        .route("/drafts/reap", post(admin::reap_drafts));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/claims", claims_routes)
        .nest("/admin", admin_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
