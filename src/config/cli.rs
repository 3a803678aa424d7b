//! CLI argument parsing using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::model::{DeviceId, VpnServerId};

/// devconf: device configuration composer
///
/// Renders device configurations from templates and layered variables,
/// serves their checksums and tracks the status reported by agents.
#[derive(Debug, Parser)]
#[command(name = "devconf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the inventory file
    #[arg(long, global = true)]
    pub inventory: Option<PathBuf>,

    /// Checksum cache TTL in seconds
    #[arg(long = "checksum-ttl", global = true)]
    pub checksum_ttl: Option<u64>,

    /// Highest tunnel id handed out to VXLAN clients
    #[arg(long = "tunnel-id-max", global = true)]
    pub tunnel_id_max: Option<u32>,

    /// Global context variable in 'KEY=VALUE' format (can be specified multiple times)
    #[arg(long = "var", value_name = "KEY=VALUE", global = true)]
    pub vars: Vec<String>,

    /// Enable verbose logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Subcommands for devconf
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = super::defaults::CONFIG_PATH)]
        output: PathBuf,
    },

    /// Print the rendered configuration of a device
    Render {
        /// Device id
        device: DeviceId,
    },

    /// Print the configuration checksum of a device
    Checksum {
        /// Device id
        device: DeviceId,
    },

    /// List the peers of a VPN server
    Peers {
        /// VPN server id
        server: VpnServerId,
    },

    /// Print the configuration status of a device
    Status {
        /// Device id
        device: DeviceId,
    },

    /// Record the outcome an agent reported
    Report {
        /// Device id
        device: DeviceId,
        /// Reported outcome
        #[arg(value_enum)]
        outcome: ReportArg,
    },

    /// Start deactivating a device configuration
    Deactivate {
        /// Device id
        device: DeviceId,
    },

    /// Reactivate a deactivated device configuration
    Activate {
        /// Device id
        device: DeviceId,
    },

    /// Render every device and report the ones that fail
    Check,
}

/// Outcome reported by an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportArg {
    /// The configuration was applied
    Applied,
    /// Applying the configuration failed
    Error,
    /// The agent stopped using the configuration
    Deactivated,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Command::Init { .. })
    }
}
