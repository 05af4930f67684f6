//! Claims core configuration

use chrono::Duration;
use serde::Deserialize;

/// Tunables for the claims services
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClaimsConfig {
    /// Upper bound on photos per claim; unbounded when unset
    pub max_photos_per_claim: Option<usize>,
    /// Age after which unsubmitted drafts may be reaped; never when unset
    pub draft_ttl_hours: Option<i64>,
    /// Top-level folder photo objects are stored under
    pub photo_path_prefix: String,
    /// Capacity of the change-notification channel
    pub event_buffer: usize,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            max_photos_per_claim: None,
            draft_ttl_hours: None,
            photo_path_prefix: "claims".to_string(),
            event_buffer: 256,
        }
    }
}

impl ClaimsConfig {
    pub fn with_max_photos(mut self, max: usize) -> Self {
        self.max_photos_per_claim = Some(max);
        self
    }

    pub fn with_draft_ttl_hours(mut self, hours: i64) -> Self {
        self.draft_ttl_hours = Some(hours);
        self
    }

    pub fn draft_ttl(&self) -> Option<Duration> {
        self.draft_ttl_hours.map(Duration::hours)
    }
}
