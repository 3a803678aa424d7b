//! Inventory persistence between runs.
//!
//! The command-line front end loads the inventory on start, applies one
//! operation and saves it back.

mod file;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

pub use file::FileInventoryStore;

use std::io;

use thiserror::Error;

use crate::inventory::Inventory;

/// Outcome of loading the inventory.
#[derive(Debug, Clone)]
pub enum LoadResult {
    /// The saved inventory.
    Loaded(Inventory),

    /// Nothing saved yet.
    NotFound,

    /// A file exists but cannot be used.
    ///
    /// Callers must not overwrite it silently; the records it holds would
    /// be lost.
    Corrupted {
        /// What went wrong, for the operator.
        reason: String,
    },
}

impl LoadResult {
    /// Returns the loaded inventory, or an empty one if nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns the reason for a [`LoadResult::Corrupted`] file.
    pub fn into_inventory(self) -> Result<Inventory, String> {
        match self {
            Self::Loaded(inventory) => Ok(inventory),
            Self::NotFound => Ok(Inventory::new()),
            Self::Corrupted { reason } => Err(reason),
        }
    }

    /// Returns `true` if an inventory was loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }
}

/// Errors raised while saving the inventory.
///
/// Read-side problems are reported through [`LoadResult`].
#[derive(Debug, Error)]
pub enum StateError {
    /// The file could not be written.
    #[error("Failed to write inventory file: {0}")]
    Write(#[source] io::Error),

    /// The inventory could not be encoded.
    #[error("Failed to serialize inventory: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Persistence for the [`Inventory`].
///
/// Implementations write atomically: a crash mid-save leaves the previous
/// file in place.
pub trait InventoryStore: Send + Sync {
    /// Loads the saved inventory.
    fn load(&self) -> LoadResult;

    /// Replaces the saved inventory.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory cannot be written.
    fn save(
        &self,
        inventory: &Inventory,
    ) -> impl std::future::Future<Output = Result<(), StateError>> + Send;
}
