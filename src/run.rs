//! Command execution.
//!
//! Each invocation loads the inventory, builds a controller around it,
//! runs one command and saves the inventory back if the command changed it.

use std::io::{self, Write};

use thiserror::Error;

use devconf::cache::CacheStore;
use devconf::compose::AutoClient;
use devconf::config::{Command, ReportArg, ValidatedConfig};
use devconf::controller::{Controller, ControllerBuilder};
use devconf::error::CoreError;
use devconf::inventory::Inventory;
use devconf::state::{FileInventoryStore, InventoryStore, LoadResult, StateError};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for command failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// The inventory file exists but cannot be used.
    #[error("Inventory file is unusable: {reason}")]
    CorruptedInventory {
        /// Why loading failed
        reason: String,
    },

    /// The controller rejected the operation.
    #[error(transparent)]
    Operation(#[from] CoreError),

    /// Failed to save the inventory.
    #[error("Failed to save inventory: {0}")]
    StateSave(#[source] StateError),

    /// Failed to write command output.
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),

    /// `check` found devices that do not render.
    #[error("{0} device(s) failed to render")]
    CheckFailed(usize),
}

/// Whether a command changed the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    ReadOnly,
    Mutated,
}

/// Runs `command` against the inventory file named by `config`.
///
/// # Errors
///
/// Returns an error if the inventory is corrupted, the operation fails or
/// the inventory cannot be saved.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig, command: &Command) -> Result<(), RunError> {
    let store = FileInventoryStore::new(&config.inventory_path);
    tracing::debug!("Inventory file: {}", store.path().display());

    let mut stdout = io::stdout();
    execute_with(&store, config.controller_builder(), command, &mut stdout).await
}

/// Runs `command` against the inventory held by `store`, writing results to `out`.
async fn execute_with<St: InventoryStore>(
    store: &St,
    builder: ControllerBuilder,
    command: &Command,
    out: &mut impl Write,
) -> Result<(), RunError> {
    let inventory = load_inventory(store)?;
    let controller = builder.inventory(inventory).build();

    if run_command(&controller, command, out).await? == Outcome::Mutated {
        store
            .save(&controller.snapshot())
            .await
            .map_err(RunError::StateSave)?;
        tracing::debug!("Inventory saved");
    }
    Ok(())
}

/// Loads the inventory, starting empty when none was saved.
///
/// A corrupted file is an error so that the next save cannot replace it.
fn load_inventory<St: InventoryStore>(store: &St) -> Result<Inventory, RunError> {
    match store.load() {
        LoadResult::Loaded(inventory) => Ok(inventory),
        LoadResult::NotFound => {
            tracing::info!("No inventory found, starting empty");
            Ok(Inventory::new())
        }
        LoadResult::Corrupted { reason } => Err(RunError::CorruptedInventory { reason }),
    }
}

async fn run_command<A, S>(
    controller: &Controller<A, S>,
    command: &Command,
    out: &mut impl Write,
) -> Result<Outcome, RunError>
where
    A: AutoClient,
    S: CacheStore,
{
    match command {
        Command::Init { .. } => Ok(Outcome::ReadOnly),
        Command::Render { device } => {
            out.write_all(&controller.render(device)?)?;
            writeln!(out)?;
            Ok(Outcome::ReadOnly)
        }
        Command::Checksum { device } => {
            writeln!(out, "{}", controller.get_checksum(device).await?)?;
            Ok(Outcome::ReadOnly)
        }
        Command::Peers { server } => {
            for peer in controller.peers_for(server)? {
                let key = peer.public_key.as_deref().unwrap_or("-");
                match peer.vni {
                    Some(vni) => writeln!(out, "{}\t{}\t{key}\t{vni}", peer.device, peer.address)?,
                    None => writeln!(out, "{}\t{}\t{key}", peer.device, peer.address)?,
                }
            }
            Ok(Outcome::ReadOnly)
        }
        Command::Status { device } => {
            writeln!(out, "{}", controller.status(device)?.as_str())?;
            Ok(Outcome::ReadOnly)
        }
        Command::Report { device, outcome } => {
            let status = match outcome {
                ReportArg::Applied => controller.mark_applied(device).await?,
                ReportArg::Error => controller.mark_error(device).await?,
                ReportArg::Deactivated => controller.confirm_deactivation(device).await?,
            };
            writeln!(out, "{}", status.as_str())?;
            Ok(Outcome::Mutated)
        }
        Command::Deactivate { device } => {
            writeln!(out, "{}", controller.deactivate(device).await?.as_str())?;
            Ok(Outcome::Mutated)
        }
        Command::Activate { device } => {
            writeln!(out, "{}", controller.activate(device).await?.as_str())?;
            Ok(Outcome::Mutated)
        }
        Command::Check => {
            let failures = controller.check();
            for (device, error) in &failures {
                writeln!(out, "{device}: {error}")?;
            }
            if failures.is_empty() {
                writeln!(out, "All devices render")?;
                Ok(Outcome::ReadOnly)
            } else {
                Err(RunError::CheckFailed(failures.len()))
            }
        }
    }
}
