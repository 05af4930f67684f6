//! Database connection pool management
//!
//! Pool sizing and timeouts come from the `database` section of the API
//! configuration (`API_DATABASE__URL`, `API_DATABASE__MAX_CONNECTIONS`, ...).
//! Migrations are embedded and applied at start-up.

use serde::Deserialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

use crate::error::DatabaseError;

/// Type alias for the PostgreSQL connection pool
pub type DatabasePool = PgPool;

/// Connection pool settings
///
/// Durations are whole seconds so they can be set from environment
/// variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a request waits for a free connection
    pub acquire_timeout_secs: u64,
    /// Connections older than this are recycled
    pub max_lifetime_secs: u64,
    /// Idle connections above `min_connections` are closed after this
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/claims".to_string(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout_secs: 30,
            max_lifetime_secs: 30 * 60,
            idle_timeout_secs: 10 * 60,
        }
    }
}

impl DatabaseConfig {
    /// Default pool settings against `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Rejects sizes the pool could never satisfy
    pub fn validate(&self) -> Result<(), DatabaseError> {
        if self.url.trim().is_empty() {
            return Err(DatabaseError::InvalidConfig("database url is empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(DatabaseError::InvalidConfig(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(DatabaseError::InvalidConfig(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .max_lifetime(Duration::from_secs(self.max_lifetime_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
    }
}

/// Creates a database connection pool with the given configuration
///
/// # Errors
///
/// * `InvalidConfig` when the settings fail [`DatabaseConfig::validate`]
/// * `ConnectionFailed` if the first connection cannot be established
///
/// # Example
///
/// ```rust,ignore
/// use infra_db::{DatabaseConfig, create_pool};
///
/// let pool = create_pool(DatabaseConfig::new("postgres://localhost/claims")).await?;
/// ```
pub async fn create_pool(config: DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    config.validate()?;
    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Creating database pool"
    );

    let pool = config
        .pool_options()
        .connect(&config.url)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!("Database pool created successfully");
    Ok(pool)
}

/// Applies the embedded migrations under `migrations/`
///
/// Already-applied migrations are skipped, so this is safe to run at every
/// start-up.
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
