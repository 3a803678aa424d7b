//! JSON file inventory store.

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::inventory::Inventory;
use crate::time::{Clock, SystemClock, unix_seconds};

use super::{InventoryStore, LoadResult, StateError};

/// Current file format version. Other versions load as corrupted.
const INVENTORY_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct InventoryFile {
    version: u32,

    /// Unix seconds; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    saved_at: Option<u64>,

    inventory: Inventory,
}

/// Stores the inventory as pretty-printed JSON.
///
/// Saves go to `{path}.tmp` first and are renamed over `path`, so the file
/// is either the old or the new inventory, never a mix.
#[derive(Debug, Clone)]
pub struct FileInventoryStore {
    path: PathBuf,
}

impl FileInventoryStore {
    /// Creates a store for `path`. Nothing is touched until the first call.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the inventory file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_blocking(path: &Path, file: &InventoryFile) -> Result<(), StateError> {
        let content = serde_json::to_string_pretty(file).map_err(StateError::Serialize)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StateError::Write)?;
            }
        }

        // inventory.json -> inventory.json.tmp
        let temp_path = PathBuf::from(format!("{}.tmp", path.display()));
        std::fs::write(&temp_path, content).map_err(StateError::Write)?;
        std::fs::rename(&temp_path, path).map_err(StateError::Write)?;

        Ok(())
    }
}

impl InventoryStore for FileInventoryStore {
    fn load(&self) -> LoadResult {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return LoadResult::NotFound,
            Err(e) => {
                return LoadResult::Corrupted {
                    reason: format!("Failed to read file: {e}"),
                };
            }
        };

        match serde_json::from_str::<InventoryFile>(&content) {
            Ok(file) if file.version != INVENTORY_FILE_VERSION => LoadResult::Corrupted {
                reason: format!(
                    "Incompatible version: expected {INVENTORY_FILE_VERSION}, got {}",
                    file.version
                ),
            },
            Ok(file) => LoadResult::Loaded(file.inventory),
            Err(e) => LoadResult::Corrupted {
                reason: format!("Invalid JSON: {e}"),
            },
        }
    }

    async fn save(&self, inventory: &Inventory) -> Result<(), StateError> {
        let path = self.path.clone();
        let file = InventoryFile {
            version: INVENTORY_FILE_VERSION,
            saved_at: Some(unix_seconds(SystemClock.now())),
            inventory: inventory.clone(),
        };

        tokio::task::spawn_blocking(move || Self::save_blocking(&path, &file))
            .await
            .map_err(|e| StateError::Write(io::Error::other(e)))?
    }
}
