//! Validated configuration after merging CLI and TOML sources.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::controller::ControllerBuilder;
use crate::model::Context;

use super::cli::Cli;
use super::defaults;
use super::error::{ConfigError, field};
use super::toml::TomlConfig;

static VARIABLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("variable name pattern is valid")
});

/// Fully validated configuration ready for use by the application.
///
/// Use [`ValidatedConfig::from_raw`] to build one from CLI args and an
/// optional TOML config.
#[derive(Debug)]
pub struct ValidatedConfig {
    /// Inventory file path
    pub inventory_path: PathBuf,

    /// Checksum cache TTL
    pub checksum_ttl: Duration,

    /// Highest tunnel id handed out to VXLAN clients
    pub tunnel_id_max: u32,

    /// Global context layer
    pub global_context: Context,

    /// Verbose logging enabled
    pub verbose: bool,
}

impl fmt::Display for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Config {{ inventory: {}, checksum_ttl: {}s, tunnel_id_max: {}, global_vars: {} }}",
            self.inventory_path.display(),
            self.checksum_ttl.as_secs(),
            self.tunnel_id_max,
            self.global_context.len(),
        )
    }
}

impl ValidatedConfig {
    /// Creates a validated configuration from CLI arguments and optional TOML config.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TTL is zero
    /// - The tunnel id bound is zero or above the VNI range
    /// - A context variable is malformed
    pub fn from_raw(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Self, ConfigError> {
        let inventory_path = cli
            .inventory
            .clone()
            .or_else(|| toml.and_then(|t| t.inventory.path.clone()))
            .unwrap_or_else(|| PathBuf::from(defaults::INVENTORY_PATH));

        Ok(Self {
            inventory_path,
            checksum_ttl: Self::resolve_checksum_ttl(cli, toml)?,
            tunnel_id_max: Self::resolve_tunnel_id_max(cli, toml)?,
            global_context: Self::resolve_context(cli, toml)?,
            verbose: cli.verbose,
        })
    }

    /// Loads and merges configuration from CLI and optional config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or
    /// if the merged configuration is invalid.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let toml = if let Some(ref path) = cli.config {
            Some(TomlConfig::load(path)?)
        } else {
            None
        };

        Self::from_raw(cli, toml.as_ref())
    }

    /// Returns a controller builder carrying these settings.
    #[must_use]
    pub fn controller_builder(&self) -> ControllerBuilder {
        ControllerBuilder::new()
            .global_context(self.global_context.clone())
            .checksum_ttl(self.checksum_ttl)
            .tunnel_id_max(self.tunnel_id_max)
    }

    fn resolve_checksum_ttl(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Duration, ConfigError> {
        let seconds = cli
            .checksum_ttl
            .or_else(|| toml.and_then(|t| t.cache.ttl))
            .unwrap_or(defaults::CHECKSUM_TTL_SECS);

        if seconds == 0 {
            return Err(ConfigError::InvalidDuration {
                field: field::CHECKSUM_TTL,
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(Duration::from_secs(seconds))
    }

    fn resolve_tunnel_id_max(cli: &Cli, toml: Option<&TomlConfig>) -> Result<u32, ConfigError> {
        let value = cli
            .tunnel_id_max
            .or_else(|| toml.and_then(|t| t.vpn.tunnel_id_max))
            .unwrap_or(defaults::TUNNEL_ID_MAX);

        if value == 0 || value > defaults::TUNNEL_ID_MAX {
            return Err(ConfigError::InvalidTunnelIdMax {
                value,
                max: defaults::TUNNEL_ID_MAX,
            });
        }
        Ok(value)
    }

    fn resolve_context(cli: &Cli, toml: Option<&TomlConfig>) -> Result<Context, ConfigError> {
        let mut context = toml.map(|t| t.context.clone()).unwrap_or_default();
        for name in context.keys() {
            check_variable_name(name, name)?;
        }
        for var in &cli.vars {
            let (name, value) = parse_variable(var)?;
            context.insert(name, value);
        }
        Ok(context)
    }
}

/// Writes the commented default configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::toml::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

fn parse_variable(s: &str) -> Result<(String, String), ConfigError> {
    let Some((name, value)) = s.split_once('=') else {
        return Err(ConfigError::InvalidVariable {
            value: s.to_string(),
            reason: "expected KEY=VALUE",
        });
    };
    let name = name.trim();
    check_variable_name(s, name)?;
    Ok((name.to_string(), value.to_string()))
}

fn check_variable_name(raw: &str, name: &str) -> Result<(), ConfigError> {
    if VARIABLE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::InvalidVariable {
            value: raw.to_string(),
            reason: "name must be letters, digits or underscores",
        })
    }
}
