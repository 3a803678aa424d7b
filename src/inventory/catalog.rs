//! The record store behind the controller.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::DeviceDependencies;
use crate::compose::RenderInput;
use crate::error::CoreError;
use crate::model::{
    Backend, ConfigStatus, Configuration, Device, DeviceGroup, DeviceId, GroupId, ModelError,
    OrgId, OrganizationSettings, Template, TemplateId, VpnAttachment, VpnClient, VpnServer,
    VpnServerId, empty_document, validate_server_id,
};
use crate::template::{TemplateError, TemplateOrderer, check_unique_name};
use crate::vpn::{Peer, PeerSource, TunnelIdAllocator, VpnError};

/// A device together with everything removed alongside it.
#[derive(Debug, Clone)]
pub struct RemovedDevice {
    /// The device record.
    pub device: Device,
    /// Its configuration.
    pub configuration: Configuration,
    /// Its VPN memberships, in attachment order.
    pub clients: Vec<VpnClient>,
}

/// Outcome of a template-list replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateChange {
    /// `true` if the list differs from the previous one.
    pub changed: bool,
    /// Memberships dropped because their VPN template was detached.
    pub detached_clients: Vec<VpnClient>,
}

/// Outcome of storing a device group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupChange {
    /// The previous version, if the group existed.
    pub previous: Option<DeviceGroup>,
    /// Members whose template list changed.
    pub retemplated: Vec<DeviceId>,
    /// Memberships dropped because their VPN template left a list.
    pub detached_clients: Vec<VpnClient>,
}

/// In-memory records of every entity the composition engine reads.
///
/// Mutations validate first and commit last, so a rejected call leaves the
/// inventory untouched. The inventory does no locking; the controller wraps
/// it in a lock and keeps caches in step with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(default)]
    devices: BTreeMap<DeviceId, Device>,
    #[serde(default)]
    configurations: BTreeMap<DeviceId, Configuration>,
    #[serde(default)]
    templates: BTreeMap<TemplateId, Template>,
    #[serde(default)]
    vpn_servers: BTreeMap<VpnServerId, VpnServer>,
    #[serde(default)]
    vpn_clients: Vec<VpnClient>,
    #[serde(default)]
    organizations: BTreeMap<OrgId, OrganizationSettings>,
    #[serde(default)]
    groups: BTreeMap<GroupId, DeviceGroup>,
    #[serde(default)]
    tunnel_ids: TunnelIdAllocator,
    #[serde(default)]
    template_sequence: u64,
}

impl Inventory {
    /// Creates an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
            && self.templates.is_empty()
            && self.vpn_servers.is_empty()
            && self.organizations.is_empty()
            && self.groups.is_empty()
    }

    /// Ids of every device, sorted.
    pub fn device_ids(&self) -> impl Iterator<Item = &DeviceId> {
        self.devices.keys()
    }

    /// Looks up a device.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn device(&self, id: &DeviceId) -> Result<&Device, CoreError> {
        self.devices
            .get(id)
            .ok_or_else(|| CoreError::not_found("device", id))
    }

    /// Looks up the configuration of a device.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn configuration(&self, device: &DeviceId) -> Result<&Configuration, CoreError> {
        self.configurations
            .get(device)
            .ok_or_else(|| CoreError::not_found("configuration", device))
    }

    /// Mutable access to the configuration of a device.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn configuration_mut(&mut self, device: &DeviceId) -> Result<&mut Configuration, CoreError> {
        self.configurations
            .get_mut(device)
            .ok_or_else(|| CoreError::not_found("configuration", device))
    }

    /// Looks up a template.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn template(&self, id: &TemplateId) -> Result<&Template, CoreError> {
        self.templates
            .get(id)
            .ok_or_else(|| CoreError::not_found("template", id))
    }

    /// The template catalog.
    #[must_use]
    pub const fn templates(&self) -> &BTreeMap<TemplateId, Template> {
        &self.templates
    }

    /// Looks up a VPN server.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn vpn_server(&self, id: &VpnServerId) -> Result<&VpnServer, CoreError> {
        self.vpn_servers
            .get(id)
            .ok_or_else(|| CoreError::not_found("VPN server", id))
    }

    /// Settings of an organization, if any were stored.
    #[must_use]
    pub fn organization(&self, id: &OrgId) -> Option<&OrganizationSettings> {
        self.organizations.get(id)
    }

    /// A device group, if it exists.
    #[must_use]
    pub fn group(&self, id: &GroupId) -> Option<&DeviceGroup> {
        self.groups.get(id)
    }

    /// Memberships of a device, in attachment order.
    pub fn clients_of<'a>(&'a self, device: &DeviceId) -> impl Iterator<Item = &'a VpnClient> {
        self.vpn_clients.iter().filter(move |c| &c.device == device)
    }

    /// Members of a server, in attachment order.
    pub fn clients_on<'a>(&'a self, server: &VpnServerId) -> impl Iterator<Item = &'a VpnClient> {
        self.vpn_clients.iter().filter(move |c| &c.server == server)
    }

    /// The membership of `device` in `server`, if any.
    #[must_use]
    pub fn client(&self, device: &DeviceId, server: &VpnServerId) -> Option<&VpnClient> {
        self.vpn_clients
            .iter()
            .find(|c| &c.device == device && &c.server == server)
    }

    /// Returns the tunnel-id allocator.
    #[must_use]
    pub const fn tunnel_ids(&self) -> &TunnelIdAllocator {
        &self.tunnel_ids
    }

    /// Returns an orderer over the template catalog.
    #[must_use]
    pub const fn orderer(&self) -> TemplateOrderer<'_> {
        TemplateOrderer::new(&self.templates)
    }

    /// Borrows everything needed to render the configuration of `device`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if the device, its configuration or
    /// one of its VPN servers is missing.
    pub fn render_input(&self, device: &DeviceId) -> Result<RenderInput<'_>, CoreError> {
        let record = self.device(device)?;
        let configuration = self.configuration(device)?;
        let vpn = self
            .clients_of(device)
            .map(|client| {
                Ok(VpnAttachment {
                    server: self.vpn_server(&client.server)?,
                    client,
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        Ok(RenderInput {
            device: record,
            configuration,
            organization: self.organization(&record.organization).map(|s| &s.context),
            group: record
                .group
                .as_ref()
                .and_then(|g| self.groups.get(g))
                .map(|g| &g.context),
            templates: &self.templates,
            vpn,
        })
    }

    /// Everything the rendered configuration of `device` depends on.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown device.
    pub fn dependencies(&self, device: &DeviceId) -> Result<DeviceDependencies, CoreError> {
        let record = self.device(device)?;
        let configuration = self.configuration(device)?;
        Ok(DeviceDependencies {
            templates: configuration.templates.clone(),
            vpn_servers: self.clients_of(device).map(|c| c.server.clone()).collect(),
            organization: record.organization.clone(),
            group: record.group.clone(),
        })
    }

    /// Adds a device with its configuration.
    ///
    /// Explicit templates are checked for backend and organization; the
    /// list then receives the defaults (if empty) or the missing required
    /// templates, followed by the templates of the device's group. The
    /// status starts at `modified`.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid or duplicate device, a configuration
    /// of another device, or an unusable template.
    pub fn insert_device(
        &mut self,
        device: Device,
        mut configuration: Configuration,
    ) -> Result<(), CoreError> {
        device.validate()?;
        if self.devices.contains_key(&device.id) {
            return Err(CoreError::already_exists("device", &device.id));
        }
        if configuration.device != device.id {
            return Err(ModelError::InvalidIdentity {
                field: "configuration",
                value: configuration.device.to_string(),
                reason: "belongs to another device",
            }
            .into());
        }
        configuration.validate()?;

        let orderer = TemplateOrderer::new(&self.templates);
        for id in &configuration.templates {
            orderer.usable(id, &configuration.backend, &device.organization)?;
        }
        configuration.templates = orderer.apply_required_defaults(&configuration, &device.organization);
        let group = self.group_templates(device.group.as_ref());
        if !group.is_empty() {
            configuration.templates =
                orderer.rescope(&configuration, &device.organization, &[], group);
        }
        configuration.status = ConfigStatus::Modified;

        debug!(
            "Added device {} with {} template(s)",
            device.id,
            configuration.templates.len()
        );
        self.configurations.insert(device.id.clone(), configuration);
        self.devices.insert(device.id.clone(), device);
        Ok(())
    }

    /// Replaces a device record and returns the previous one.
    ///
    /// The activity flag is kept; only deactivation and activation change
    /// it. On a change of organization the templates the new organization
    /// cannot see are detached and its required templates attached. On a
    /// change of group the old group's templates are detached and the new
    /// group's attached. Configurations of deactivated devices are left
    /// alone.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown or invalid device.
    pub fn replace_device(
        &mut self,
        mut device: Device,
    ) -> Result<(Device, TemplateChange), CoreError> {
        device.validate()?;
        let previous = self.device(&device.id)?.clone();
        device.active = previous.active;

        let id = device.id.clone();
        let group_changed = previous.group != device.group;
        let configuration = self.configuration(&id)?;
        let rescoped = (group_changed || previous.organization != device.organization)
            && previous.active
            && !configuration.status.is_deactivation();
        let templates = rescoped.then(|| {
            let (dropped, added) = if group_changed {
                (
                    self.group_templates(previous.group.as_ref()),
                    self.group_templates(device.group.as_ref()),
                )
            } else {
                (&[][..], &[][..])
            };
            self.orderer()
                .rescope(configuration, &device.organization, dropped, added)
        });

        self.devices.insert(id.clone(), device);
        let change = match templates {
            Some(templates) => self.set_templates(&id, templates)?,
            None => TemplateChange::default(),
        };
        if change.changed {
            debug!("Templates of device {id} follow its new scope");
        }
        Ok((previous, change))
    }

    /// Removes a device, its configuration and its VPN memberships.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown device.
    pub fn remove_device(&mut self, id: &DeviceId) -> Result<RemovedDevice, CoreError> {
        let device = self
            .devices
            .remove(id)
            .ok_or_else(|| CoreError::not_found("device", id))?;
        let configuration = self
            .configurations
            .remove(id)
            .ok_or_else(|| CoreError::not_found("configuration", id))?;
        let clients = self.remove_clients_of(id);
        Ok(RemovedDevice {
            device,
            configuration,
            clients,
        })
    }

    /// Adds a template and returns the devices it was attached to.
    ///
    /// The template gets the next creation sequence number. A required
    /// template is attached to every configuration it applies to.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid template, a duplicate id or name, or
    /// an unknown VPN server.
    pub fn insert_template(&mut self, template: Template) -> Result<Vec<DeviceId>, CoreError> {
        let mut template = template.normalize()?;
        if self.templates.contains_key(&template.id) {
            return Err(CoreError::already_exists("template", &template.id));
        }
        self.check_template(&template)?;

        self.template_sequence += 1;
        template.created = self.template_sequence;
        let id = template.id.clone();
        let required = template.required;
        self.templates.insert(id.clone(), template);
        Ok(if required {
            self.attach_required(&id)
        } else {
            Vec::new()
        })
    }

    /// Replaces a template.
    ///
    /// Returns the previous version and the devices a newly required
    /// template was attached to. The creation sequence is preserved.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown or invalid template, a duplicate
    /// name, an unknown VPN server, or a backend change while in use.
    pub fn replace_template(
        &mut self,
        template: Template,
    ) -> Result<(Template, Vec<DeviceId>), CoreError> {
        let mut template = template.normalize()?;
        let previous = self.template(&template.id)?.clone();
        self.check_template(&template)?;
        if previous.backend != template.backend {
            let in_use = self
                .configurations
                .values()
                .any(|c| c.has_template(&template.id));
            if in_use {
                return Err(TemplateError::BackendMismatch {
                    template: template.id,
                    expected: previous.backend,
                    found: template.backend,
                }
                .into());
            }
        }

        template.created = previous.created;
        let id = template.id.clone();
        let required = template.required;
        self.templates.insert(id.clone(), template);
        let attached = if required {
            self.attach_required(&id)
        } else {
            Vec::new()
        };
        Ok((previous, attached))
    }

    /// Replaces the template list of a configuration.
    ///
    /// Memberships of VPN servers no longer referenced by any remaining VPN
    /// template are removed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown device.
    pub fn set_templates(
        &mut self,
        device: &DeviceId,
        templates: Vec<TemplateId>,
    ) -> Result<TemplateChange, CoreError> {
        let configuration = self.configuration(device)?;
        if configuration.templates == templates {
            return Ok(TemplateChange::default());
        }

        let servers_of = |ids: &[TemplateId]| -> BTreeSet<VpnServerId> {
            ids.iter()
                .filter_map(|id| self.templates.get(id))
                .filter_map(|t| t.vpn.clone())
                .collect()
        };
        let before = servers_of(&configuration.templates);
        let after = servers_of(&templates);

        self.configuration_mut(device)?.templates = templates;
        let detached_clients = before
            .difference(&after)
            .filter_map(|server| self.remove_client(device, server))
            .collect();
        Ok(TemplateChange {
            changed: true,
            detached_clients,
        })
    }

    /// Adds a VPN server.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIdentity`] for an id that cannot suffix
    /// a context variable, [`CoreError::AlreadyExists`] for a duplicate id,
    /// or [`ModelError::NotAnObject`] for a non-object document.
    pub fn insert_vpn_server(&mut self, server: VpnServer) -> Result<(), CoreError> {
        validate_server_id(&server.id)?;
        if self.vpn_servers.contains_key(&server.id) {
            return Err(CoreError::already_exists("VPN server", &server.id));
        }
        check_server_document(&server)?;
        self.vpn_servers.insert(server.id.clone(), server);
        Ok(())
    }

    /// Replaces a VPN server and returns the previous version.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown server, or
    /// [`ModelError::NotAnObject`] for a non-object document.
    pub fn replace_vpn_server(&mut self, server: VpnServer) -> Result<VpnServer, CoreError> {
        check_server_document(&server)?;
        let previous = self.vpn_server(&server.id)?.clone();
        self.vpn_servers.insert(server.id.clone(), server);
        Ok(previous)
    }

    /// Adds a VPN membership and returns it as stored.
    ///
    /// On servers using tunnel ids, a requested id is reserved and a
    /// missing one is allocated. On servers with a fixed VNI the client id
    /// is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`VpnError::DuplicateVpnClient`] if the device already joined
    /// the server, a tunnel-id error, or [`CoreError::NotFound`].
    pub fn insert_client(&mut self, mut client: VpnClient, max_tunnel_id: u32) -> Result<VpnClient, CoreError> {
        self.configuration(&client.device)?;
        let server = self.vpn_server(&client.server)?;
        if self.client(&client.device, &client.server).is_some() {
            return Err(VpnError::DuplicateVpnClient {
                device: client.device,
                server: client.server,
            }
            .into());
        }

        if server.uses_tunnel_ids() {
            let in_use: BTreeSet<u32> = self
                .clients_on(&client.server)
                .filter_map(|c| c.vni)
                .collect();
            match client.vni {
                Some(vni) => self
                    .tunnel_ids
                    .reserve(&client.server, vni, &in_use, max_tunnel_id)?,
                None => {
                    let vni = self
                        .tunnel_ids
                        .allocate(&client.server, &in_use, max_tunnel_id)?;
                    client.vni = Some(vni);
                }
            }
        } else {
            client.vni = None;
        }

        self.vpn_clients.push(client.clone());
        Ok(client)
    }

    /// Removes the membership of `device` in `server`.
    pub fn remove_client(&mut self, device: &DeviceId, server: &VpnServerId) -> Option<VpnClient> {
        let position = self
            .vpn_clients
            .iter()
            .position(|c| &c.device == device && &c.server == server)?;
        Some(self.vpn_clients.remove(position))
    }

    /// Removes every membership of `device`.
    pub fn remove_clients_of(&mut self, device: &DeviceId) -> Vec<VpnClient> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.vpn_clients)
            .into_iter()
            .partition(|c| &c.device == device);
        self.vpn_clients = kept;
        removed
    }

    /// Stores organization settings and returns the previous ones.
    pub fn set_organization_settings(
        &mut self,
        settings: OrganizationSettings,
    ) -> Option<OrganizationSettings> {
        self.organizations
            .insert(settings.organization.clone(), settings)
    }

    /// Stores a device group.
    ///
    /// When the group templates change, every active member swaps the old
    /// group templates for the new ones.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`] for an unknown group template, or
    /// [`TemplateError::OrganizationMismatch`] for one the group's
    /// organization cannot see. Nothing is stored on error.
    pub fn set_group(&mut self, group: DeviceGroup) -> Result<GroupChange, CoreError> {
        let orderer = self.orderer();
        for id in &group.templates {
            if !orderer.get(id)?.is_visible_to(&group.organization) {
                return Err(TemplateError::OrganizationMismatch {
                    template: id.clone(),
                    organization: group.organization.clone(),
                }
                .into());
            }
        }

        let current = group.templates.clone();
        let previous = self.groups.insert(group.id.clone(), group.clone());
        let old = previous
            .as_ref()
            .map(|g| g.templates.clone())
            .unwrap_or_default();
        let mut change = GroupChange {
            previous,
            ..GroupChange::default()
        };
        if old == current {
            return Ok(change);
        }

        let members: Vec<DeviceId> = self
            .devices
            .values()
            .filter(|d| d.active && d.group.as_ref() == Some(&group.id))
            .map(|d| d.id.clone())
            .collect();
        for id in members {
            let organization = self.device(&id)?.organization.clone();
            let configuration = self.configuration(&id)?;
            if configuration.status.is_deactivation() {
                continue;
            }
            let templates = self
                .orderer()
                .rescope(configuration, &organization, &old, &current);
            let applied = self.set_templates(&id, templates)?;
            if applied.changed {
                change.retemplated.push(id);
            }
            change.detached_clients.extend(applied.detached_clients);
        }
        debug!(
            "Templates of group {} changed, {} member(s) updated",
            group.id,
            change.retemplated.len()
        );
        Ok(change)
    }

    /// Moves a configuration to another backend.
    ///
    /// Templates of the old backend are dropped. The required templates of
    /// the new one are attached (its defaults too if nothing survived),
    /// followed by the group templates of that backend.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown device.
    pub fn set_backend(
        &mut self,
        device: &DeviceId,
        backend: Backend,
    ) -> Result<TemplateChange, CoreError> {
        let record = self.device(device)?;
        let configuration = self.configuration(device)?;
        if configuration.backend == backend {
            return Ok(TemplateChange::default());
        }

        let orderer = self.orderer();
        let mut moved = Configuration::new(device.clone(), backend);
        moved.templates = orderer.rebackend(configuration, &record.organization, &moved.backend);
        let group = self.group_templates(record.group.as_ref());
        let templates = orderer.rescope(&moved, &record.organization, &[], group);

        self.configuration_mut(device)?.backend = moved.backend;
        let mut change = self.set_templates(device, templates)?;
        change.changed = true;
        Ok(change)
    }

    /// Empties a configuration being deactivated.
    ///
    /// The document is emptied, every template is detached (required ones
    /// included), every VPN membership is dropped and the device is flagged
    /// inactive. Returns the dropped memberships.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown device.
    pub fn clear_for_deactivation(&mut self, device: &DeviceId) -> Result<Vec<VpnClient>, CoreError> {
        self.device(device)?;
        let configuration = self.configuration_mut(device)?;
        configuration.document = empty_document();
        configuration.templates.clear();
        if let Some(record) = self.devices.get_mut(device) {
            record.active = false;
        }
        Ok(self.remove_clients_of(device))
    }

    /// Reattaches the default and group templates of a reactivated
    /// configuration and flags the device active again.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown device.
    pub fn restore_defaults(&mut self, device: &DeviceId) -> Result<(), CoreError> {
        let record = self
            .devices
            .get_mut(device)
            .ok_or_else(|| CoreError::not_found("device", device))?;
        record.active = true;
        let organization = record.organization.clone();
        let group = record
            .group
            .as_ref()
            .and_then(|g| self.groups.get(g))
            .map_or(&[][..], |g| &g.templates[..]);
        let orderer = TemplateOrderer::new(&self.templates);
        let configuration = self
            .configurations
            .get_mut(device)
            .ok_or_else(|| CoreError::not_found("configuration", device))?;
        configuration.templates = orderer.apply_required_defaults(configuration, &organization);
        if !group.is_empty() {
            configuration.templates = orderer.rescope(configuration, &organization, &[], group);
        }
        Ok(())
    }

    fn group_templates(&self, group: Option<&GroupId>) -> &[TemplateId] {
        group
            .and_then(|g| self.groups.get(g))
            .map_or(&[][..], |g| &g.templates[..])
    }

    fn check_template(&self, template: &Template) -> Result<(), CoreError> {
        check_unique_name(self.templates.values(), template)?;
        if let Some(server) = &template.vpn {
            if !self.vpn_servers.contains_key(server) {
                return Err(ModelError::UnknownVpnServer {
                    template: template.id.clone(),
                    server: server.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Attaches a required template wherever it applies.
    ///
    /// Deactivating and deactivated configurations are skipped.
    fn attach_required(&mut self, template: &TemplateId) -> Vec<DeviceId> {
        let orderer = TemplateOrderer::new(&self.templates);
        let Some(required) = self.templates.get(template) else {
            return Vec::new();
        };
        let mut attached = Vec::new();
        for (id, configuration) in &mut self.configurations {
            let Some(device) = self.devices.get(id) else {
                continue;
            };
            if configuration.status.is_deactivation()
                || configuration.has_template(template)
                || !required.is_required_for(&configuration.backend, &device.organization)
            {
                continue;
            }
            configuration.templates =
                orderer.apply_required_defaults(configuration, &device.organization);
            attached.push(id.clone());
        }
        if !attached.is_empty() {
            debug!(
                "Required template {template} attached to {} configuration(s)",
                attached.len()
            );
        }
        attached
    }
}

impl PeerSource for Inventory {
    fn load_peers(&self, server: &VpnServerId) -> Option<Vec<Peer>> {
        if !self.vpn_servers.contains_key(server) {
            return None;
        }
        Some(self.clients_on(server).filter_map(Peer::from_client).collect())
    }
}

fn check_server_document(server: &VpnServer) -> Result<(), ModelError> {
    if server.document.is_object() {
        return Ok(());
    }
    Err(ModelError::NotAnObject {
        field: "document",
        owner: server.id.to_string(),
    })
}
