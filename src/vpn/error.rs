//! Error types for VPN membership changes.

use thiserror::Error;

use crate::model::{DeviceId, VpnServerId};

/// Error type for rejected VPN client attachments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VpnError {
    /// The configuration already has a client on this server.
    #[error("Device '{device}' already has a client on VPN server '{server}'")]
    DuplicateVpnClient {
        /// The device
        device: DeviceId,
        /// The server
        server: VpnServerId,
    },

    /// Another client of the server already holds the tunnel id.
    #[error("Tunnel id {vni} is already used on VPN server '{server}'")]
    DuplicateTunnelId {
        /// The server
        server: VpnServerId,
        /// The requested tunnel id
        vni: u32,
    },

    /// Every tunnel id in the configured range is taken.
    #[error("No free tunnel id left on VPN server '{server}' (maximum {max})")]
    TunnelIdExhausted {
        /// The server
        server: VpnServerId,
        /// Upper bound of the id range
        max: u32,
    },

    /// A tunnel id is outside the configured range.
    #[error("Tunnel id {vni} is out of range 1..={max}")]
    TunnelIdOutOfRange {
        /// The requested tunnel id
        vni: u32,
        /// Upper bound of the id range
        max: u32,
    },

    /// The peer source does not know the server.
    #[error("VPN server '{0}' not found")]
    UnknownServer(VpnServerId),
}
