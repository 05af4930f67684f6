//! Object key and URL helpers shared by the adapters

use crate::error::BlobError;

/// Rejects keys that are empty, absolute, or climb out of the store
pub fn validate_key(key: &str) -> Result<&str, BlobError> {
    let trimmed = key.trim();
    if trimmed.is_empty()
        || trimmed.starts_with('/')
        || trimmed.contains('\\')
        || trimmed.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    Ok(trimmed)
}

/// Public URL for `key` under `base_url`
pub fn public_url(base_url: &str, key: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), key)
}

/// Inverse of `public_url`; `None` for URLs under another base
///
/// Query strings and fragments (signed URLs, cache busters) are ignored.
pub fn key_from_url(base_url: &str, url: &str) -> Option<String> {
    let base = base_url.trim_end_matches('/');
    let rest = url.strip_prefix(base)?.strip_prefix('/')?;
    let key = rest.split(['?', '#']).next().unwrap_or_default();
    validate_key(key).ok().map(str::to_string)
}
