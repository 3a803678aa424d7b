//! VPN peer bookkeeping.
//!
//! This module provides:
//! - The per-server peer cache ([`VpnPeerRegistry`], [`Peer`], [`PeerSource`])
//! - Monotonic tunnel-id allocation for VXLAN-style servers ([`TunnelIdAllocator`])
//! - Error handling ([`VpnError`])

mod error;
mod peers;
mod tunnel;

#[cfg(test)]
mod peers_tests;

pub use error::VpnError;
pub use peers::{Peer, PeerSource, VpnPeerRegistry};
pub use tunnel::TunnelIdAllocator;
