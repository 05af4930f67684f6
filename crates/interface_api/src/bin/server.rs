//! Roadside Claims - API Server Binary
//!
//! This binary starts the HTTP API server for the claims portal.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin claims-api
//!
//! # Run with environment variables
//! API_PORT=8080 API_DATABASE__URL=postgres://... API_BLOB__BACKEND=s3 cargo run --bin claims-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` / `API_PORT` - Listen address (default: 0.0.0.0:8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_DATABASE__URL` - PostgreSQL connection string
//! * `API_DATABASE__MAX_CONNECTIONS`, `API_DATABASE__MIN_CONNECTIONS`, `API_DATABASE__ACQUIRE_TIMEOUT_SECS`
//! * `API_LOG_LEVEL` - trace, debug, info, warn, error (default: info)
//! * `API_BLOB__BACKEND` - `s3` or `local` (default: local)
//! * `API_BLOB__BUCKET`, `API_BLOB__REGION`, `API_BLOB__ENDPOINT`, `API_BLOB__PUBLIC_BASE_URL`
//! * `API_CLAIMS__MAX_PHOTOS_PER_CLAIM`, `API_CLAIMS__DRAFT_TTL_HOURS`

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_claims::{Actor, ClaimServices};
use infra_db::{create_pool, run_migrations, PostgresClaimStore};
use interface_api::{config::ApiConfig, create_router, AppState};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, connects the claim store and
/// photo storage, and starts the HTTP server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid API configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        blob_backend = ?config.blob.backend,
        "Starting Roadside Claims API Server"
    );

    let pool = create_pool(config.database.clone())
        .await
        .context("database connection failed")?;
    run_migrations(&pool).await.context("database migrations failed")?;

    let store = PostgresClaimStore::with_event_buffer(pool, config.claims.event_buffer);
    let blobs = infra_blob::connect(&config.blob)
        .await
        .context("photo storage setup failed")?;

    let services = ClaimServices::new(
        std::sync::Arc::new(store),
        blobs.store.clone(),
        config.claims.clone(),
    );

    if config.claims.draft_ttl().is_some() {
        spawn_draft_reaper(services.clone(), config.reap_interval_hours);
    }

    let addr: SocketAddr = config.server_addr().parse().context("invalid listen address")?;
    let state = AppState::new(services, config).with_blob_health(blobs.health);
    let app = create_router(state);

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Periodically deletes drafts older than the configured TTL
fn spawn_draft_reaper(services: ClaimServices, interval_hours: u64) {
    let every = Duration::from_secs(interval_hours.max(1) * 3600);
    let reaper = Actor::admin("system:draft-reaper");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = services.authoring.reap_abandoned_drafts(&reaper).await {
                tracing::warn!(error = %e, "draft reaping failed");
            }
        }
    });
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// In-flight requests complete before the process exits.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
