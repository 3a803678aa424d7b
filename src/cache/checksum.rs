//! Checksum computation and caching.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::{DeviceId, GroupId, OrgId, TemplateId, VpnServerId};

use super::{CacheError, CacheStore, DependencyIndex, MemoryCacheStore};

/// Returns the lowercase hex SHA-256 digest of `bytes`.
#[must_use]
pub fn checksum(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Returns the store key of a device's checksum.
#[must_use]
pub fn cache_key(device: &DeviceId) -> String {
    format!("config:checksum:{device}")
}

/// Produces the rendered bytes of a device configuration on a cache miss.
pub trait DocumentSource: Send + Sync {
    /// Renders the configuration of `device`.
    ///
    /// # Errors
    ///
    /// Returns the render error; the cache propagates it unchanged.
    fn render(&self, device: &DeviceId) -> Result<Vec<u8>, CoreError>;
}

/// Per-device checksum cache.
///
/// # Concurrency
///
/// - misses for one device are serialized by a per-device async mutex, so at
///   most one render per device is in flight; other devices are unaffected
/// - invalidation takes the same mutex, so a render that started before a
///   change cannot leave its stale checksum behind
/// - fan-out walks the affected devices one by one without a global lock
///
/// # Failures
///
/// A failed render writes nothing. A failing store fails the call.
pub struct ChecksumCache<D, S = MemoryCacheStore> {
    source: D,
    store: S,
    ttl: Duration,
    index: DependencyIndex,
    locks: DashMap<DeviceId, Arc<Mutex<()>>>,
}

impl<D: DocumentSource, S: CacheStore> ChecksumCache<D, S> {
    /// Creates a cache rendering through `source` and storing into `store`.
    pub fn new(source: D, store: S, ttl: Duration) -> Self {
        Self {
            source,
            store,
            ttl,
            index: DependencyIndex::new(),
            locks: DashMap::new(),
        }
    }

    /// Returns the document source.
    pub const fn source(&self) -> &D {
        &self.source
    }

    /// Returns the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Returns the reverse dependency index.
    pub const fn index(&self) -> &DependencyIndex {
        &self.index
    }

    /// Returns the entry TTL.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the checksum of `device`, rendering on a miss.
    ///
    /// # Errors
    ///
    /// Returns the render error on a failed render, or
    /// [`CoreError::Cache`] if the store fails.
    pub async fn get_checksum(&self, device: &DeviceId) -> Result<String, CoreError> {
        let key = cache_key(device);
        if let Some(hit) = self.lookup(&key).await? {
            return Ok(hit);
        }

        let lock = self.lock_for(device);
        let _guard = lock.lock().await;
        // Another caller may have filled the entry while we waited.
        if let Some(hit) = self.lookup(&key).await? {
            return Ok(hit);
        }

        debug!("Checksum cache miss for device {device}, rendering");
        let bytes = self.source.render(device).inspect_err(|e| {
            warn!("Render of device {device} failed: {e}");
        })?;
        let value = checksum(&bytes);
        self.store
            .set(&key, value.clone(), self.ttl)
            .await
            .map_err(|e| CacheError::new("set", &key, e))?;
        Ok(value)
    }

    /// Returns the cached checksum of `device` without rendering.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cache`] if the store fails.
    pub async fn cached(&self, device: &DeviceId) -> Result<Option<String>, CoreError> {
        self.lookup(&cache_key(device)).await
    }

    /// Drops the checksum of `device`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cache`] if the store fails.
    pub async fn invalidate(&self, device: &DeviceId) -> Result<(), CoreError> {
        let key = cache_key(device);
        let lock = self.lock_for(device);
        let _guard = lock.lock().await;
        self.store
            .delete(&key)
            .await
            .map_err(|e| CacheError::new("delete", &key, e))?;
        debug!("Invalidated checksum of device {device}");
        Ok(())
    }

    /// Drops the checksums of every device using `template`.
    ///
    /// # Errors
    ///
    /// See [`Self::invalidate_many`].
    pub async fn invalidate_by_template(&self, template: &TemplateId) -> Result<usize, CoreError> {
        let devices = self.index.devices_for_template(template);
        self.invalidate_many(&format!("template {template}"), &devices)
            .await
    }

    /// Drops the checksums of every device with a client on `server`.
    ///
    /// # Errors
    ///
    /// See [`Self::invalidate_many`].
    pub async fn invalidate_by_vpn_server(&self, server: &VpnServerId) -> Result<usize, CoreError> {
        let devices = self.index.devices_for_vpn_server(server);
        self.invalidate_many(&format!("VPN server {server}"), &devices)
            .await
    }

    /// Drops the checksums of every device of `organization`.
    ///
    /// # Errors
    ///
    /// See [`Self::invalidate_many`].
    pub async fn invalidate_by_org(&self, organization: &OrgId) -> Result<usize, CoreError> {
        let devices = self.index.devices_for_org(organization);
        self.invalidate_many(&format!("organization {organization}"), &devices)
            .await
    }

    /// Drops the checksums of every device in `group`.
    ///
    /// # Errors
    ///
    /// See [`Self::invalidate_many`].
    pub async fn invalidate_by_group(&self, group: &GroupId) -> Result<usize, CoreError> {
        let devices = self.index.devices_for_group(group);
        self.invalidate_many(&format!("group {group}"), &devices)
            .await
    }

    /// Invalidates each device independently and returns how many succeeded.
    ///
    /// A failure does not stop the walk; the first error is returned once
    /// every device has been tried.
    ///
    /// # Errors
    ///
    /// Returns the first [`CoreError::Cache`] encountered.
    pub async fn invalidate_many(
        &self,
        dependency: &str,
        devices: &[DeviceId],
    ) -> Result<usize, CoreError> {
        let mut first_error = None;
        let mut invalidated = 0;
        for device in devices {
            match self.invalidate(device).await {
                Ok(()) => invalidated += 1,
                Err(e) => {
                    warn!("Failed to invalidate device {device}: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }
        info!(
            "Invalidated {invalidated}/{} checksums depending on {dependency}",
            devices.len()
        );
        first_error.map_or(Ok(invalidated), Err)
    }

    /// Drops every trace of a removed device.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cache`] if the store fails.
    pub async fn forget(&self, device: &DeviceId) -> Result<(), CoreError> {
        self.invalidate(device).await?;
        self.index.remove(device);
        self.locks.remove(device);
        Ok(())
    }

    async fn lookup(&self, key: &str) -> Result<Option<String>, CoreError> {
        let value = self
            .store
            .get(key)
            .await
            .map_err(|e| CacheError::new("get", key, e))?;
        Ok(value)
    }

    fn lock_for(&self, device: &DeviceId) -> Arc<Mutex<()>> {
        self.locks
            .entry(device.clone())
            .or_default()
            .value()
            .clone()
    }
}
