//! Tunnel id (VNI) allocation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::VpnServerId;

use super::VpnError;

/// Allocates numeric tunnel ids per VPN server.
///
/// Ids grow monotonically from a per-server high-water mark. Once the mark
/// reaches the upper bound, allocation falls back to the lowest id no
/// active client holds. An id still held is never handed out again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TunnelIdAllocator {
    high_water: BTreeMap<VpnServerId, u32>,
}

impl TunnelIdAllocator {
    /// Creates an allocator with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the highest id handed out for `server` so far.
    #[must_use]
    pub fn high_water(&self, server: &VpnServerId) -> u32 {
        self.high_water.get(server).copied().unwrap_or(0)
    }

    /// Allocates the next free id for `server`.
    ///
    /// `in_use` holds the ids of the server's active clients.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::TunnelIdExhausted`] if every id in `1..=max` is
    /// held.
    pub fn allocate(
        &mut self,
        server: &VpnServerId,
        in_use: &BTreeSet<u32>,
        max: u32,
    ) -> Result<u32, VpnError> {
        let mut next = self.high_water(server).checked_add(1);
        while let Some(candidate) = next.filter(|n| *n <= max && in_use.contains(n)) {
            next = candidate.checked_add(1);
        }
        let vni = match next.filter(|n| *n <= max) {
            Some(vni) => vni,
            None => lowest_free(in_use, max).ok_or_else(|| VpnError::TunnelIdExhausted {
                server: server.clone(),
                max,
            })?,
        };
        self.bump(server, vni);
        debug!("Allocated tunnel id {vni} on VPN server {server}");
        Ok(vni)
    }

    /// Claims an explicitly requested id.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::DuplicateTunnelId`] if another client holds it, or
    /// [`VpnError::TunnelIdOutOfRange`] if it is outside `1..=max`.
    pub fn reserve(
        &mut self,
        server: &VpnServerId,
        vni: u32,
        in_use: &BTreeSet<u32>,
        max: u32,
    ) -> Result<(), VpnError> {
        if vni == 0 || vni > max {
            return Err(VpnError::TunnelIdOutOfRange { vni, max });
        }
        if in_use.contains(&vni) {
            return Err(VpnError::DuplicateTunnelId {
                server: server.clone(),
                vni,
            });
        }
        self.bump(server, vni);
        Ok(())
    }

    /// Forgets the history of a removed server.
    pub fn forget(&mut self, server: &VpnServerId) {
        self.high_water.remove(server);
    }

    fn bump(&mut self, server: &VpnServerId, vni: u32) {
        let mark = self.high_water.entry(server.clone()).or_insert(0);
        *mark = (*mark).max(vni);
    }
}

fn lowest_free(in_use: &BTreeSet<u32>, max: u32) -> Option<u32> {
    let mut candidate: u32 = 1;
    for &used in in_use.range(1..=max) {
        if used != candidate {
            break;
        }
        candidate = candidate.checked_add(1)?;
    }
    (candidate <= max).then_some(candidate)
}
