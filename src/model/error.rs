//! Error types for model construction and validation.

use thiserror::Error;

use super::{TemplateId, VpnServerId};

/// Error type for records that fail structural validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    /// A device identity field has an invalid format.
    #[error("Invalid {field} '{value}': {reason}")]
    InvalidIdentity {
        /// Name of the offending field
        field: &'static str,
        /// The rejected value
        value: String,
        /// Human readable reason
        reason: &'static str,
    },

    /// A template of type VPN does not reference a VPN server.
    #[error("Template '{template}' is of type VPN but has no VPN server")]
    MissingVpnServer {
        /// The offending template
        template: TemplateId,
    },

    /// A template references a VPN server that does not exist.
    #[error("Template '{template}' references unknown VPN server '{server}'")]
    UnknownVpnServer {
        /// The offending template
        template: TemplateId,
        /// The missing server
        server: VpnServerId,
    },

    /// A record that must be a JSON object is something else.
    #[error("The {field} of '{owner}' is not a JSON object")]
    NotAnObject {
        /// Which field was checked
        field: &'static str,
        /// Identifier of the owning record
        owner: String,
    },
}
