//! API configuration

use serde::Deserialize;

use domain_claims::ClaimsConfig;
use infra_blob::BlobConfig;
use infra_db::DatabaseConfig;

/// API configuration
///
/// Every field has a default; environment variables override them, e.g.
/// `API_PORT=9000`, `API_DATABASE__MAX_CONNECTIONS=40`, `API_BLOB__BACKEND=s3`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Connection pool
    pub database: DatabaseConfig,
    /// Log level
    pub log_level: String,
    /// Largest accepted photo upload request, in bytes
    pub max_upload_bytes: usize,
    /// Hours between abandoned-draft sweeps; only used when a draft TTL is set
    pub reap_interval_hours: u64,
    /// Photo storage
    pub blob: BlobConfig,
    /// Claims tunables
    pub claims: ClaimsConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database: DatabaseConfig::default(),
            log_level: "info".to_string(),
            max_upload_bytes: 20 * 1024 * 1024,
            reap_interval_hours: 1,
            blob: BlobConfig::default(),
            claims: ClaimsConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_`-prefixed environment variables
    ///
    /// Nested sections use `__`, so `API_BLOB__BUCKET` sets `blob.bucket`.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("API")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
