//! TOML configuration file parsing.

use std::path::Path;

use serde::Deserialize;

use crate::model::Context;

use super::ConfigError;

/// Root configuration structure from TOML file.
///
/// All fields are optional so a partial file can be merged with CLI
/// arguments.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Inventory persistence section
    #[serde(default)]
    pub inventory: InventorySection,

    /// Checksum cache section
    #[serde(default)]
    pub cache: CacheSection,

    /// VPN section
    #[serde(default)]
    pub vpn: VpnSection,

    /// Global context variables, the lowest context layer
    #[serde(default)]
    pub context: Context,
}

/// Inventory persistence section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InventorySection {
    /// Inventory file path
    pub path: Option<std::path::PathBuf>,
}

/// Checksum cache section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSection {
    /// Checksum TTL in seconds
    pub ttl: Option<u64>,
}

/// VPN section.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VpnSection {
    /// Highest tunnel id handed out to VXLAN clients
    pub tunnel_id_max: Option<u32>,
}

impl TomlConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }
}

/// Generates a default configuration file with comments.
#[must_use]
pub fn default_config_template() -> String {
    r#"# devconf configuration file

[inventory]
# Inventory file (default: devconf-inventory.json)
# path = "devconf-inventory.json"

[cache]
# Checksum TTL in seconds (default: 2592000, 30 days)
# ttl = 2592000

[vpn]
# Highest tunnel id handed out to VXLAN clients (default: 16777216)
# tunnel_id_max = 16777216

[context]
# Variables available to every template, lowest precedence.
# Organization, group and device variables override these.
# Values given with --var override the ones below key by key.
# ntp_server = "pool.ntp.org"
"#
    .to_string()
}
