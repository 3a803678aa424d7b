//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid duration value.
    #[error("Invalid duration for {field}: {reason}")]
    InvalidDuration {
        /// Name of the field
        field: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Tunnel id bound outside `1..=16777216`.
    #[error("Invalid tunnel id maximum {value}: expected 1 to {max}")]
    InvalidTunnelIdMax {
        /// The rejected value
        value: u32,
        /// Largest accepted value
        max: u32,
    },

    /// Malformed context variable.
    #[error("Invalid context variable '{value}': {reason}")]
    InvalidVariable {
        /// The variable as given
        value: String,
        /// Reason for invalidity
        reason: &'static str,
    },
}

/// Well-known field names for `InvalidDuration` errors.
pub mod field {
    /// The checksum TTL field.
    pub const CHECKSUM_TTL: &str = "checksum_ttl";
}
