//! Shared inventory handle and the cache's document source.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::cache::DocumentSource;
use crate::compose::{AutoClient, ConfigComposer};
use crate::error::CoreError;
use crate::inventory::Inventory;
use crate::model::DeviceId;

/// Inventory shared between the controller and its document source.
pub type SharedInventory = Arc<RwLock<Inventory>>;

/// Read access that survives a poisoned lock.
///
/// Inventory mutations validate before they commit, so a panic while the
/// lock was held cannot leave a half-applied change behind.
pub(crate) fn read(inventory: &RwLock<Inventory>) -> RwLockReadGuard<'_, Inventory> {
    inventory.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write access that survives a poisoned lock.
pub(crate) fn write(inventory: &RwLock<Inventory>) -> RwLockWriteGuard<'_, Inventory> {
    inventory.write().unwrap_or_else(PoisonError::into_inner)
}

/// Renders device configurations straight from the inventory.
pub struct InventoryDocuments<A> {
    inventory: SharedInventory,
    composer: Arc<ConfigComposer<A>>,
}

impl<A> InventoryDocuments<A> {
    /// Creates a source over `inventory`.
    pub const fn new(inventory: SharedInventory, composer: Arc<ConfigComposer<A>>) -> Self {
        Self {
            inventory,
            composer,
        }
    }
}

impl<A: AutoClient> DocumentSource for InventoryDocuments<A> {
    fn render(&self, device: &DeviceId) -> Result<Vec<u8>, CoreError> {
        let inventory = read(&self.inventory);
        let input = inventory.render_input(device)?;
        Ok(self.composer.render(&input)?)
    }
}
