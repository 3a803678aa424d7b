//! Application startup and utilities.
//!
//! Exit codes, tracing setup and error hints for the main entry point.

use devconf::config::{ConfigError, field};
use devconf::error::ErrorKind;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::run::RunError;

/// Application exit codes.
pub mod exit_code {
    use std::process::ExitCode;

    /// Success (exit code 0).
    pub const SUCCESS: ExitCode = ExitCode::SUCCESS;

    /// Configuration error (exit code 1) - invalid args, unreadable config file, etc.
    pub const CONFIG_ERROR: ExitCode = ExitCode::FAILURE;

    /// Runtime error (exit code 2) - rejected operation, unusable inventory, etc.
    ///
    /// A function because `ExitCode::from()` is not `const fn`.
    pub fn runtime_error() -> ExitCode {
        ExitCode::from(2)
    }
}

/// Prints helpful hints for common configuration errors.
pub fn print_config_hint(error: &ConfigError) {
    match error {
        ConfigError::FileRead { .. } => {
            eprintln!("\nRun 'devconf init' to generate a configuration template.");
        }
        ConfigError::InvalidDuration { field: f, .. } if *f == field::CHECKSUM_TTL => {
            eprintln!("\nThe checksum TTL is given in seconds, e.g. --checksum-ttl 3600.");
        }
        _ => {}
    }
}

/// Prints helpful hints for common command failures.
pub fn print_run_hint(error: &RunError) {
    match error {
        RunError::CorruptedInventory { .. } => {
            eprintln!("\nFix or move the inventory file; it is never overwritten while unreadable.");
        }
        RunError::Operation(e) if e.kind() == ErrorKind::InvalidTransition => {
            eprintln!("\nRun 'devconf status <device>' to see the current status.");
        }
        RunError::Operation(e) if e.kind() == ErrorKind::MissingVariable => {
            eprintln!("\nDefine the variable with --var or in the [context] table of the config file.");
        }
        _ => {}
    }
}

/// Sets up the tracing subscriber for logging.
pub fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
