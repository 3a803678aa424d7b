//! Reverse dependency index for invalidation fan-out.

use std::collections::BTreeSet;
use std::hash::Hash;

use dashmap::DashMap;

use crate::model::{DeviceId, GroupId, OrgId, TemplateId, VpnServerId};

/// What one device's rendered configuration depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDependencies {
    /// Attached templates.
    pub templates: Vec<TemplateId>,
    /// Joined VPN servers.
    pub vpn_servers: Vec<VpnServerId>,
    /// Owning organization.
    pub organization: OrgId,
    /// Device group, if any.
    pub group: Option<GroupId>,
}

/// Maps every upstream entity to the devices whose checksum depends on it.
///
/// The index is updated by replacing a device's full dependency set, so
/// callers never patch individual edges. Callers serialize updates for the
/// same device (the inventory write lock does this).
#[derive(Debug, Default)]
pub struct DependencyIndex {
    devices: DashMap<DeviceId, DeviceDependencies>,
    by_template: DashMap<TemplateId, BTreeSet<DeviceId>>,
    by_vpn_server: DashMap<VpnServerId, BTreeSet<DeviceId>>,
    by_org: DashMap<OrgId, BTreeSet<DeviceId>>,
    by_group: DashMap<GroupId, BTreeSet<DeviceId>>,
}

impl DependencyIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the dependencies recorded for `device`.
    pub fn record(&self, device: &DeviceId, dependencies: DeviceDependencies) {
        let previous = self.devices.insert(device.clone(), dependencies.clone());
        link(&self.by_template, &dependencies.templates, device);
        link(&self.by_vpn_server, &dependencies.vpn_servers, device);
        link(&self.by_org, std::slice::from_ref(&dependencies.organization), device);
        link(&self.by_group, dependencies.group.as_slice(), device);
        // Edges present in both sets are never dropped, so a concurrent
        // fan-out cannot miss the device.
        if let Some(previous) = previous {
            self.unlink(device, &previous, Some(&dependencies));
        }
    }

    /// Drops every edge of `device`.
    pub fn remove(&self, device: &DeviceId) {
        if let Some((_, previous)) = self.devices.remove(device) {
            self.unlink(device, &previous, None);
        }
    }

    /// Returns the dependencies recorded for `device`.
    #[must_use]
    pub fn dependencies(&self, device: &DeviceId) -> Option<DeviceDependencies> {
        self.devices.get(device).map(|entry| entry.value().clone())
    }

    /// Devices with `template` attached.
    #[must_use]
    pub fn devices_for_template(&self, template: &TemplateId) -> Vec<DeviceId> {
        collect(&self.by_template, template)
    }

    /// Devices with a client on `server`.
    #[must_use]
    pub fn devices_for_vpn_server(&self, server: &VpnServerId) -> Vec<DeviceId> {
        collect(&self.by_vpn_server, server)
    }

    /// Devices owned by `organization`.
    #[must_use]
    pub fn devices_for_org(&self, organization: &OrgId) -> Vec<DeviceId> {
        collect(&self.by_org, organization)
    }

    /// Devices in `group`.
    #[must_use]
    pub fn devices_for_group(&self, group: &GroupId) -> Vec<DeviceId> {
        collect(&self.by_group, group)
    }

    /// Drops the edges of `previous` that `kept` does not carry.
    fn unlink(
        &self,
        device: &DeviceId,
        previous: &DeviceDependencies,
        kept: Option<&DeviceDependencies>,
    ) {
        let templates = kept.map_or(&[][..], |k| k.templates.as_slice());
        let servers = kept.map_or(&[][..], |k| k.vpn_servers.as_slice());
        let orgs = kept.map_or(&[][..], |k| std::slice::from_ref(&k.organization));
        let groups = kept.map_or(&[][..], |k| k.group.as_slice());

        unlink(&self.by_template, &previous.templates, templates, device);
        unlink(&self.by_vpn_server, &previous.vpn_servers, servers, device);
        unlink(&self.by_org, std::slice::from_ref(&previous.organization), orgs, device);
        unlink(&self.by_group, previous.group.as_slice(), groups, device);
    }
}

fn link<K: Eq + Hash + Clone>(map: &DashMap<K, BTreeSet<DeviceId>>, keys: &[K], device: &DeviceId) {
    for key in keys {
        map.entry(key.clone()).or_default().insert(device.clone());
    }
}

fn unlink<K: Eq + Hash>(
    map: &DashMap<K, BTreeSet<DeviceId>>,
    keys: &[K],
    kept: &[K],
    device: &DeviceId,
) {
    for key in keys.iter().filter(|key| !kept.contains(key)) {
        if let Some(mut devices) = map.get_mut(key) {
            devices.remove(device);
        }
        map.remove_if(key, |_, devices| devices.is_empty());
    }
}

fn collect<K: Eq + Hash>(map: &DashMap<K, BTreeSet<DeviceId>>, key: &K) -> Vec<DeviceId> {
    map.get(key)
        .map(|devices| devices.iter().cloned().collect())
        .unwrap_or_default()
}
