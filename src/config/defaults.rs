//! Default values for configuration options.

use std::time::Duration;

use crate::controller::{DEFAULT_CHECKSUM_TTL, DEFAULT_TUNNEL_ID_MAX};

/// Default inventory file, relative to the working directory.
pub const INVENTORY_PATH: &str = "devconf-inventory.json";

/// Default configuration file name written by `init`.
pub const CONFIG_PATH: &str = "devconf.toml";

/// Default checksum TTL in seconds (30 days).
pub const CHECKSUM_TTL_SECS: u64 = DEFAULT_CHECKSUM_TTL.as_secs();

/// Largest tunnel id a VXLAN server can hand out.
pub const TUNNEL_ID_MAX: u32 = DEFAULT_TUNNEL_ID_MAX;

/// Default checksum TTL as Duration.
#[must_use]
pub const fn checksum_ttl() -> Duration {
    DEFAULT_CHECKSUM_TTL
}
