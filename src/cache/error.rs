//! Error types for the checksum cache.

use thiserror::Error;

/// Error reported by a [`CacheStore`](super::CacheStore) backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backend cannot serve the request.
    #[error("Cache store unavailable: {0}")]
    Unavailable(String),
}

/// Error type for cache operations.
///
/// Store failures always fail the call; a stale or fabricated checksum is
/// never returned in their place.
#[derive(Debug, Error)]
#[error("Cache {operation} of '{key}' failed: {source}")]
pub struct CacheError {
    /// The store operation (`get`, `set`, `delete`)
    pub operation: &'static str,
    /// The cache key involved
    pub key: String,
    /// What the store reported
    #[source]
    pub source: StoreError,
}

impl CacheError {
    pub(crate) fn new(operation: &'static str, key: &str, source: StoreError) -> Self {
        Self {
            operation,
            key: key.to_string(),
            source,
        }
    }
}
