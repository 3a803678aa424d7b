//! Controller construction.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::cache::{CacheStore, ChecksumCache, MemoryCacheStore};
use crate::compose::{AutoClient, ConfigComposer, TunnelStanzaGenerator};
use crate::context::ContextResolver;
use crate::inventory::Inventory;
use crate::model::Context;
use crate::status::EventBus;

use super::{Controller, InventoryDocuments};

/// Default lifetime of a cached checksum (30 days).
pub const DEFAULT_CHECKSUM_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Default upper bound of tunnel ids (the VXLAN VNI range).
pub const DEFAULT_TUNNEL_ID_MAX: u32 = 16_777_216;

/// Builder for [`Controller`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use devconf::controller::Controller;
///
/// let controller = Controller::builder()
///     .checksum_ttl(Duration::from_secs(3600))
///     .build();
/// assert_eq!(controller.cache().ttl(), Duration::from_secs(3600));
/// ```
#[derive(Debug, Clone)]
pub struct ControllerBuilder {
    global: Context,
    ttl: Duration,
    tunnel_id_max: u32,
    event_capacity: usize,
    inventory: Inventory,
}

impl Default for ControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerBuilder {
    /// Creates a builder with default settings and an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            global: Context::new(),
            ttl: DEFAULT_CHECKSUM_TTL,
            tunnel_id_max: DEFAULT_TUNNEL_ID_MAX,
            event_capacity: EventBus::DEFAULT_CAPACITY,
            inventory: Inventory::new(),
        }
    }

    /// Sets the process-wide context layer.
    #[must_use]
    pub fn global_context(mut self, context: Context) -> Self {
        self.global = context;
        self
    }

    /// Sets the lifetime of cached checksums.
    #[must_use]
    pub const fn checksum_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets the upper bound of allocated tunnel ids.
    #[must_use]
    pub const fn tunnel_id_max(mut self, max: u32) -> Self {
        self.tunnel_id_max = max;
        self
    }

    /// Sets how many events a slow subscriber may lag behind.
    #[must_use]
    pub const fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Starts from a previously saved inventory.
    #[must_use]
    pub fn inventory(mut self, inventory: Inventory) -> Self {
        self.inventory = inventory;
        self
    }

    /// Builds a controller with the default auto-client and an in-memory
    /// cache store.
    #[must_use]
    pub fn build(self) -> Controller {
        self.build_with(TunnelStanzaGenerator, MemoryCacheStore::new())
    }

    /// Builds a controller with a custom auto-client and cache store.
    #[must_use]
    pub fn build_with<A, S>(self, auto_client: A, store: S) -> Controller<A, S>
    where
        A: AutoClient,
        S: CacheStore,
    {
        let inventory = Arc::new(RwLock::new(self.inventory));
        let composer = Arc::new(ConfigComposer::with_auto_client(
            ContextResolver::new(self.global),
            auto_client,
        ));
        let documents = InventoryDocuments::new(Arc::clone(&inventory), Arc::clone(&composer));
        let cache = ChecksumCache::new(documents, store, self.ttl);
        Controller::from_parts(
            inventory,
            composer,
            cache,
            EventBus::new(self.event_capacity),
            self.tunnel_id_max,
        )
    }
}
