//! Per-server peer cache.

use std::net::IpAddr;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{DeviceId, VpnClient, VpnServerId};

use super::VpnError;

/// One tunnel endpoint advertised by a VPN server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// The member device.
    pub device: DeviceId,
    /// Client public key (WireGuard).
    pub public_key: Option<String>,
    /// Client address inside the tunnel subnet.
    pub address: IpAddr,
    /// Client tunnel id (VXLAN).
    pub vni: Option<u32>,
}

impl Peer {
    /// Derives the peer entry of a client.
    ///
    /// Returns `None` for manually managed clients and for clients without
    /// an assigned address; neither is advertised.
    #[must_use]
    pub fn from_client(client: &VpnClient) -> Option<Self> {
        if !client.auto_provisioned {
            return None;
        }
        Some(Self {
            device: client.device.clone(),
            public_key: client.public_key.clone(),
            address: client.address?,
            vni: client.vni,
        })
    }
}

/// Storage collaborator the registry rebuilds from.
pub trait PeerSource {
    /// Returns the peers of `server` in attachment order, or `None` if the
    /// server is unknown.
    fn load_peers(&self, server: &VpnServerId) -> Option<Vec<Peer>>;
}

/// Caches the ordered peer list of every VPN server.
///
/// - a read on a cold server rebuilds the list from a [`PeerSource`]
/// - an attachment appends to a warm list directly, without a rebuild
/// - a detachment drops the list; the next read rebuilds it
///
/// Updates must be serialized with writes to the [`PeerSource`], and rebuilds
/// must read a source no writer is changing. Otherwise an append that lands
/// after a detachment and a rebuild advertises a client that already left.
/// Appends skip devices already present.
#[derive(Debug, Default)]
pub struct VpnPeerRegistry {
    entries: DashMap<VpnServerId, Vec<Peer>>,
}

impl VpnPeerRegistry {
    /// Creates an empty (fully cold) registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the peers of `server`, rebuilding the list if it is cold.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::UnknownServer`] if the source does not know it.
    pub fn peers_for<P>(&self, server: &VpnServerId, source: &P) -> Result<Vec<Peer>, VpnError>
    where
        P: PeerSource + ?Sized,
    {
        if let Some(peers) = self.entries.get(server) {
            return Ok(peers.value().clone());
        }
        let peers = self
            .entries
            .entry(server.clone())
            .or_try_insert_with(|| {
                debug!("Rebuilding peer list of VPN server {server}");
                source
                    .load_peers(server)
                    .ok_or_else(|| VpnError::UnknownServer(server.clone()))
            })?;
        Ok(peers.value().clone())
    }

    /// Records a new client. Only a warm list is touched.
    pub fn on_client_attached(&self, client: &VpnClient) {
        let Some(peer) = Peer::from_client(client) else {
            return;
        };
        if let Some(mut peers) = self.entries.get_mut(&client.server) {
            if !peers.iter().any(|p| p.device == peer.device) {
                debug!(
                    "Appending peer {} to VPN server {}",
                    peer.device, client.server
                );
                peers.push(peer);
            }
        }
    }

    /// Records a removed client by dropping the server's list.
    pub fn on_client_detached(&self, client: &VpnClient) {
        self.invalidate(&client.server);
    }

    /// Drops the cached list of `server`.
    pub fn invalidate(&self, server: &VpnServerId) {
        if self.entries.remove(server).is_some() {
            debug!("Peer list of VPN server {server} invalidated");
        }
    }

    /// Returns `true` if the list of `server` is cached.
    #[must_use]
    pub fn is_warm(&self, server: &VpnServerId) -> bool {
        self.entries.contains_key(server)
    }
}
