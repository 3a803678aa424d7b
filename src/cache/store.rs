//! Cache store contract and the in-memory implementation.

use std::future::Future;
use std::time::{Duration, SystemTime};

use dashmap::DashMap;

use crate::time::{Clock, SystemClock};

use super::StoreError;

/// Key/value store holding checksums.
///
/// May be backed by an external service with TTL support or by process
/// memory. Implementations must treat deleting an absent key as success.
pub trait CacheStore: Send + Sync {
    /// Returns the live value of `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be reached.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Stores `value` under `key` for at most `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be reached.
    fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be reached.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    /// `None` when the TTL overflows the clock; the entry then never expires.
    expires_at: Option<SystemTime>,
}

/// In-process [`CacheStore`] with lazy TTL expiry.
///
/// Expired entries are dropped when read.
#[derive(Debug, Default)]
pub struct MemoryCacheStore<C = SystemClock> {
    entries: DashMap<String, Entry>,
    clock: C,
}

impl MemoryCacheStore {
    /// Creates an empty store using the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> MemoryCacheStore<C> {
    /// Creates an empty store using the given clock.
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Returns the clock used for expiry.
    #[must_use]
    pub const fn clock(&self) -> &C {
        &self.clock
    }

    /// Returns the number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: Clock> CacheStore for MemoryCacheStore<C> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = self.clock.now();
        let removed = self
            .entries
            .remove_if(key, |_, entry| entry.expires_at.is_some_and(|at| at <= now));
        if removed.is_some() {
            return Ok(None);
        }
        Ok(self.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = self.clock.now().checked_add(ttl);
        self.entries
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}
