//! The controller facade.

use std::slice;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, ChecksumCache, MemoryCacheStore, checksum};
use crate::compose::{AutoClient, ConfigComposer, TunnelStanzaGenerator};
use crate::error::CoreError;
use crate::inventory::{Inventory, RemovedDevice};
use crate::model::{
    Backend, ConfigStatus, Configuration, Context, Device, DeviceGroup, DeviceId, GroupId,
    ModelError, OrgId, OrganizationSettings, Template, TemplateId, VpnClient, VpnServer,
    VpnServerId,
};
use crate::status::{
    ConfigEvent, EventBus, ModifiedReason, StatusEvent, Transition, device_transition,
};
use crate::template::{TemplateError, TemplateOrderer};
use crate::vpn::{Peer, VpnPeerRegistry};

use super::documents::{InventoryDocuments, SharedInventory, read, write};
use super::ControllerBuilder;

/// Entry point of the composition engine.
///
/// Owns the inventory, the composer, the checksum cache, the VPN peer
/// registry and the event bus, and keeps them coherent:
///
/// - every mutation that can change a rendered document moves the affected
///   configurations to `modified` and drops their checksums
/// - the new status is written before the checksum is dropped, and events
///   are published last
/// - the VPN peer registry is updated under the inventory write lock and
///   rebuilt under its read lock
/// - the inventory lock is never held across an `await`
///
/// Mutations are rejected before anything is committed.
pub struct Controller<A = TunnelStanzaGenerator, S = MemoryCacheStore> {
    inventory: SharedInventory,
    composer: Arc<ConfigComposer<A>>,
    cache: ChecksumCache<InventoryDocuments<A>, S>,
    peers: VpnPeerRegistry,
    events: EventBus,
    tunnel_id_max: u32,
}

impl Controller {
    /// Returns a builder with default settings.
    #[must_use]
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::new()
    }
}

impl<A: AutoClient, S: CacheStore> Controller<A, S> {
    pub(super) fn from_parts(
        inventory: SharedInventory,
        composer: Arc<ConfigComposer<A>>,
        cache: ChecksumCache<InventoryDocuments<A>, S>,
        events: EventBus,
        tunnel_id_max: u32,
    ) -> Self {
        let controller = Self {
            inventory,
            composer,
            cache,
            peers: VpnPeerRegistry::new(),
            events,
            tunnel_id_max,
        };
        {
            let inventory = read(&controller.inventory);
            for device in inventory.device_ids() {
                controller.reindex(&inventory, device);
            }
        }
        controller
    }

    /// Returns the composer.
    pub fn composer(&self) -> &ConfigComposer<A> {
        &self.composer
    }

    /// Returns the checksum cache.
    pub const fn cache(&self) -> &ChecksumCache<InventoryDocuments<A>, S> {
        &self.cache
    }

    /// Returns the upper bound of allocated tunnel ids.
    pub const fn tunnel_id_max(&self) -> u32 {
        self.tunnel_id_max
    }

    /// Returns a copy of the inventory, e.g. for persistence.
    pub fn snapshot(&self) -> Inventory {
        read(&self.inventory).clone()
    }

    /// Returns a copy of a device's configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown device.
    pub fn configuration(&self, device: &DeviceId) -> Result<Configuration, CoreError> {
        read(&self.inventory).configuration(device).cloned()
    }

    /// Returns the status of a device's configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown device.
    pub fn status(&self, device: &DeviceId) -> Result<ConfigStatus, CoreError> {
        Ok(read(&self.inventory).configuration(device)?.status)
    }

    /// Returns the resolved context of a device.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown device.
    pub fn context(&self, device: &DeviceId) -> Result<Context, CoreError> {
        let inventory = read(&self.inventory);
        let input = inventory.render_input(device)?;
        Ok(self.composer.context(&input))
    }

    /// Builds the rendered document of a device.
    ///
    /// # Errors
    ///
    /// Returns the composition error, or [`CoreError::NotFound`].
    pub fn document(&self, device: &DeviceId) -> Result<Value, CoreError> {
        let inventory = read(&self.inventory);
        let input = inventory.render_input(device)?;
        Ok(self.composer.compose(&input)?)
    }

    /// Renders a device configuration to its canonical bytes.
    ///
    /// Pure: nothing is cached and nothing changes.
    ///
    /// # Errors
    ///
    /// Returns the composition error, or [`CoreError::NotFound`].
    pub fn render(&self, device: &DeviceId) -> Result<Vec<u8>, CoreError> {
        let inventory = read(&self.inventory);
        let input = inventory.render_input(device)?;
        Ok(self.composer.render(&input)?)
    }

    /// Returns the checksum of a device configuration, rendering on a miss.
    ///
    /// # Errors
    ///
    /// Returns the render error, or [`CoreError::Cache`] if the store fails.
    pub async fn get_checksum(&self, device: &DeviceId) -> Result<String, CoreError> {
        self.cache.get_checksum(device).await
    }

    /// Renders every configuration and returns the failures.
    pub fn check(&self) -> Vec<(DeviceId, CoreError)> {
        let inventory = read(&self.inventory);
        inventory
            .device_ids()
            .filter_map(|device| {
                let rendered = inventory
                    .render_input(device)
                    .and_then(|input| Ok(self.composer.render(&input)?));
                rendered.err().map(|e| (device.clone(), e))
            })
            .collect()
    }

    /// Drops the checksum of one device.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cache`] if the store fails.
    pub async fn invalidate(&self, device: &DeviceId) -> Result<(), CoreError> {
        self.cache.invalidate(device).await
    }

    /// Drops the checksums of every device using `template`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cache`] if the store fails.
    pub async fn invalidate_by_template(&self, template: &TemplateId) -> Result<usize, CoreError> {
        self.cache.invalidate_by_template(template).await
    }

    /// Drops the checksums of every device with a client on `server`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cache`] if the store fails.
    pub async fn invalidate_by_vpn_server(&self, server: &VpnServerId) -> Result<usize, CoreError> {
        self.cache.invalidate_by_vpn_server(server).await
    }

    /// Drops the checksums of every device of `organization`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cache`] if the store fails.
    pub async fn invalidate_by_org(&self, organization: &OrgId) -> Result<usize, CoreError> {
        self.cache.invalidate_by_org(organization).await
    }

    /// Drops the checksums of every device in `group`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cache`] if the store fails.
    pub async fn invalidate_by_group(&self, group: &GroupId) -> Result<usize, CoreError> {
        self.cache.invalidate_by_group(group).await
    }

    /// Records that the agent applied the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Status`] if the current status does not allow it.
    pub async fn mark_applied(&self, device: &DeviceId) -> Result<ConfigStatus, CoreError> {
        self.apply(device, StatusEvent::AgentApplied).await
    }

    /// Records that the agent failed to apply the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown device.
    pub async fn mark_error(&self, device: &DeviceId) -> Result<ConfigStatus, CoreError> {
        self.apply(device, StatusEvent::AgentFailed).await
    }

    /// Moves a configuration to `modified` and drops its checksum.
    ///
    /// Configurations of deactivated devices keep their status.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] or [`CoreError::Cache`].
    pub async fn mark_modified(
        &self,
        device: &DeviceId,
        reason: ModifiedReason,
    ) -> Result<ConfigStatus, CoreError> {
        self.apply(device, StatusEvent::Modified(reason)).await
    }

    /// Starts deactivating a configuration.
    ///
    /// The document is emptied and every template and VPN membership is
    /// detached, required templates included.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Status`] for a deactivated configuration.
    pub async fn deactivate(&self, device: &DeviceId) -> Result<ConfigStatus, CoreError> {
        self.apply(device, StatusEvent::Deactivate).await
    }

    /// Confirms that the agent stopped using the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Status`] unless the configuration is deactivating.
    pub async fn confirm_deactivation(&self, device: &DeviceId) -> Result<ConfigStatus, CoreError> {
        self.apply(device, StatusEvent::ConfirmDeactivation).await
    }

    /// Reactivates a deactivated configuration with its default templates.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Status`] unless the device is deactivated.
    pub async fn activate(&self, device: &DeviceId) -> Result<ConfigStatus, CoreError> {
        self.apply(device, StatusEvent::Activate).await
    }

    /// Returns the peers of a VPN server in attachment order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Vpn`] for an unknown server.
    pub fn peers_for(&self, server: &VpnServerId) -> Result<Vec<Peer>, CoreError> {
        let inventory = read(&self.inventory);
        Ok(self.peers.peers_for(server, &*inventory)?)
    }

    /// Renders a VPN server's own document with its peer list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] or the composition error.
    pub fn render_vpn_server(&self, server: &VpnServerId) -> Result<Vec<u8>, CoreError> {
        let inventory = read(&self.inventory);
        let record = inventory.vpn_server(server)?;
        let peers = self.peers.peers_for(server, &*inventory)?;
        Ok(self.composer.render_vpn_server(record, &peers)?)
    }

    /// Returns the checksum of a VPN server's document.
    ///
    /// # Errors
    ///
    /// See [`Self::render_vpn_server`].
    pub fn vpn_server_checksum(&self, server: &VpnServerId) -> Result<String, CoreError> {
        Ok(checksum(&self.render_vpn_server(server)?))
    }

    /// Joins a device to a VPN server and returns the stored membership.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Vpn`] for a duplicate membership or tunnel id,
    /// or when no tunnel id is left.
    pub async fn attach_vpn_client(&self, client: VpnClient) -> Result<VpnClient, CoreError> {
        let stored = {
            let mut inventory = write(&self.inventory);
            let stored = inventory.insert_client(client, self.tunnel_id_max)?;
            self.reindex(&inventory, &stored.device);
            self.peers.on_client_attached(&stored);
            stored
        };
        info!("Device {} joined VPN server {}", stored.device, stored.server);
        self.events.publish(ConfigEvent::PeersChanged {
            server: stored.server.clone(),
        });
        self.modify(
            slice::from_ref(&stored.device),
            ModifiedReason::VpnMembership(stored.server.clone()),
        )
        .await?;
        Ok(stored)
    }

    /// Removes a device from a VPN server. Returns `None` if it was not a
    /// member.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown device.
    pub async fn detach_vpn_client(
        &self,
        device: &DeviceId,
        server: &VpnServerId,
    ) -> Result<Option<VpnClient>, CoreError> {
        let removed = {
            let mut inventory = write(&self.inventory);
            inventory.device(device)?;
            let removed = inventory.remove_client(device, server);
            if let Some(client) = &removed {
                self.reindex(&inventory, device);
                self.drop_peer_lists(slice::from_ref(client));
            }
            removed
        };
        if let Some(client) = &removed {
            info!("Device {device} left VPN server {server}");
            self.publish_peer_changes(slice::from_ref(client));
            self.modify(
                slice::from_ref(device),
                ModifiedReason::VpnMembership(server.clone()),
            )
            .await?;
        }
        Ok(removed)
    }

    /// Adds a device with its configuration.
    ///
    /// # Errors
    ///
    /// See [`Inventory::insert_device`].
    pub async fn add_device(
        &self,
        device: Device,
        configuration: Configuration,
    ) -> Result<(), CoreError> {
        let id = device.id.clone();
        {
            let mut inventory = write(&self.inventory);
            inventory.insert_device(device, configuration)?;
            self.reindex(&inventory, &id);
        }
        info!("Device {id} added");
        self.cache.invalidate(&id).await
    }

    /// Removes a device, its configuration and its VPN memberships.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] or [`CoreError::Cache`].
    pub async fn remove_device(&self, device: &DeviceId) -> Result<RemovedDevice, CoreError> {
        let removed = {
            let mut inventory = write(&self.inventory);
            let removed = inventory.remove_device(device)?;
            self.drop_peer_lists(&removed.clients);
            removed
        };
        info!("Device {device} removed");
        self.publish_peer_changes(&removed.clients);
        self.cache.forget(device).await?;
        Ok(removed)
    }

    /// Replaces a device record.
    ///
    /// Changes to identity, name, group or organization modify the
    /// configuration. A new group or organization also rescopes the
    /// templates, see [`Inventory::replace_device`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] or [`CoreError::Model`].
    pub async fn update_device(&self, device: Device) -> Result<(), CoreError> {
        let id = device.id.clone();
        let (affects, detached) = {
            let mut inventory = write(&self.inventory);
            let (previous, change) = inventory.replace_device(device)?;
            self.reindex(&inventory, &id);
            self.drop_peer_lists(&change.detached_clients);
            let affects = change.changed || inventory.device(&id)?.affects_configuration(&previous);
            (affects, change.detached_clients)
        };
        self.publish_peer_changes(&detached);
        if affects {
            self.modify(slice::from_ref(&id), ModifiedReason::DeviceIdentity)
                .await?;
        } else {
            debug!("Update of device {id} does not affect its configuration");
        }
        Ok(())
    }

    /// Adds a template. A required template is attached wherever it applies.
    ///
    /// # Errors
    ///
    /// See [`Inventory::insert_template`].
    pub async fn add_template(&self, template: Template) -> Result<(), CoreError> {
        let id = template.id.clone();
        let attached = {
            let mut inventory = write(&self.inventory);
            let attached = inventory.insert_template(template)?;
            for device in &attached {
                self.reindex(&inventory, device);
            }
            attached
        };
        info!("Template {id} added");
        self.modify(&attached, ModifiedReason::Templates).await
    }

    /// Replaces a template.
    ///
    /// A content change modifies every configuration using it.
    ///
    /// # Errors
    ///
    /// See [`Inventory::replace_template`].
    pub async fn update_template(&self, template: Template) -> Result<(), CoreError> {
        let id = template.id.clone();
        let (differs, attached) = {
            let mut inventory = write(&self.inventory);
            let (previous, attached) = inventory.replace_template(template)?;
            for device in &attached {
                self.reindex(&inventory, device);
            }
            (inventory.template(&id)?.content_differs(&previous), attached)
        };
        if differs {
            let devices = self.cache.index().devices_for_template(&id);
            info!("Template {id} changed, {} configuration(s) affected", devices.len());
            self.modify(&devices, ModifiedReason::TemplateContent(id.clone()))
                .await?;
        }
        self.modify(&attached, ModifiedReason::Templates).await
    }

    /// Attaches one template to a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Template`] if the template is unusable.
    pub async fn attach_template(
        &self,
        device: &DeviceId,
        template: &TemplateId,
    ) -> Result<(), CoreError> {
        self.change_templates(device, |orderer, configuration, organization| {
            orderer.attach(configuration, organization, template)
        })
        .await
    }

    /// Detaches one template from a configuration.
    ///
    /// Detaching a VPN template also ends the membership in its server.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::RequiredTemplateViolation`] for a required
    /// template.
    pub async fn detach_template(
        &self,
        device: &DeviceId,
        template: &TemplateId,
    ) -> Result<(), CoreError> {
        self.change_templates(device, |orderer, configuration, organization| {
            orderer.detach(configuration, organization, template)
        })
        .await
    }

    /// Replaces the template selection of a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Template`] if a template is unusable or a
    /// required one is missing.
    pub async fn set_templates(
        &self,
        device: &DeviceId,
        templates: &[TemplateId],
    ) -> Result<(), CoreError> {
        self.change_templates(device, |orderer, configuration, organization| {
            orderer.select(configuration, organization, templates)
        })
        .await
    }

    /// Detaches every template except the required ones.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown device.
    pub async fn clear_templates(&self, device: &DeviceId) -> Result<(), CoreError> {
        self.change_templates(device, |orderer, configuration, organization| {
            Ok(orderer.clear(configuration, organization))
        })
        .await
    }

    /// Replaces the configuration's own context.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown device.
    pub async fn set_context(&self, device: &DeviceId, context: Context) -> Result<(), CoreError> {
        self.edit_configuration(device, ModifiedReason::Context, |configuration| {
            if configuration.context == context {
                return false;
            }
            configuration.context = context;
            true
        })
        .await
    }

    /// Replaces the configuration's base document.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotAnObject`] unless `document` is an object.
    pub async fn set_document(&self, device: &DeviceId, document: Value) -> Result<(), CoreError> {
        if !document.is_object() {
            return Err(ModelError::NotAnObject {
                field: "document",
                owner: device.to_string(),
            }
            .into());
        }
        self.edit_configuration(device, ModifiedReason::Document, |configuration| {
            if configuration.document == document {
                return false;
            }
            configuration.document = document;
            true
        })
        .await
    }

    /// Moves a configuration to another backend.
    ///
    /// See [`Inventory::set_backend`] for the resulting template list.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] for an unknown device.
    pub async fn change_backend(&self, device: &DeviceId, backend: Backend) -> Result<(), CoreError> {
        let detached = {
            let mut inventory = write(&self.inventory);
            let change = inventory.set_backend(device, backend)?;
            if !change.changed {
                return Ok(());
            }
            self.reindex(&inventory, device);
            self.drop_peer_lists(&change.detached_clients);
            change.detached_clients
        };
        self.publish_peer_changes(&detached);
        self.modify(slice::from_ref(device), ModifiedReason::Backend)
            .await
    }

    /// Adds a VPN server.
    ///
    /// # Errors
    ///
    /// See [`Inventory::insert_vpn_server`].
    pub fn add_vpn_server(&self, server: VpnServer) -> Result<(), CoreError> {
        let id = server.id.clone();
        write(&self.inventory).insert_vpn_server(server)?;
        info!("VPN server {id} added");
        Ok(())
    }

    /// Replaces a VPN server.
    ///
    /// Any change modifies every configuration with a client on it; a
    /// backend change also drops the cached peer list.
    ///
    /// # Errors
    ///
    /// See [`Inventory::replace_vpn_server`].
    pub async fn update_vpn_server(&self, server: VpnServer) -> Result<(), CoreError> {
        let id = server.id.clone();
        let (differs, backend_changed) = {
            let mut inventory = write(&self.inventory);
            let previous = inventory.replace_vpn_server(server)?;
            let current = inventory.vpn_server(&id)?;
            let backend_changed = current.backend() != previous.backend();
            if backend_changed {
                self.peers.invalidate(&id);
            }
            (current != &previous, backend_changed)
        };
        if backend_changed {
            self.events.publish(ConfigEvent::PeersChanged { server: id.clone() });
        }
        if differs {
            let devices = self.cache.index().devices_for_vpn_server(&id);
            info!("VPN server {id} changed, {} configuration(s) affected", devices.len());
            self.modify(&devices, ModifiedReason::VpnServer(id.clone()))
                .await?;
        }
        Ok(())
    }

    /// Stores organization settings and drops the checksums of its devices.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Cache`] if the store fails.
    pub async fn set_organization_settings(
        &self,
        settings: OrganizationSettings,
    ) -> Result<(), CoreError> {
        let organization = settings.organization.clone();
        let previous = write(&self.inventory).set_organization_settings(settings.clone());
        if previous.as_ref() == Some(&settings) {
            return Ok(());
        }
        self.cache.invalidate_by_org(&organization).await?;
        Ok(())
    }

    /// Stores a device group and drops the checksums of its devices.
    ///
    /// Members whose template list follows a change of the group templates
    /// become modified.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Template`] for an unusable group template, or
    /// [`CoreError::Cache`] if the store fails.
    pub async fn set_group(&self, group: DeviceGroup) -> Result<(), CoreError> {
        let id = group.id.clone();
        let change = {
            let mut inventory = write(&self.inventory);
            let change = inventory.set_group(group.clone())?;
            for device in &change.retemplated {
                self.reindex(&inventory, device);
            }
            self.drop_peer_lists(&change.detached_clients);
            change
        };
        if change.previous.as_ref() == Some(&group) {
            return Ok(());
        }
        self.publish_peer_changes(&change.detached_clients);
        self.cache.invalidate_by_group(&id).await?;
        if !change.retemplated.is_empty() {
            info!(
                "Templates of group {id} changed, {} configuration(s) affected",
                change.retemplated.len()
            );
        }
        self.modify(&change.retemplated, ModifiedReason::Templates)
            .await
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigEvent> {
        self.events.subscribe()
    }

    /// Change notifications as a stream.
    pub fn events(&self) -> impl Stream<Item = ConfigEvent> + Send + 'static {
        self.events.stream()
    }

    /// Applies a lifecycle event to one configuration.
    async fn apply(&self, device: &DeviceId, event: StatusEvent) -> Result<ConfigStatus, CoreError> {
        let (step, detached) = {
            let mut inventory = write(&self.inventory);
            let active = inventory.device(device)?.active;
            let current = inventory.configuration(device)?.status;
            let step = device_transition(active, current, &event)?;
            let detached = match event {
                StatusEvent::Deactivate if step.is_change() => {
                    inventory.clear_for_deactivation(device)?
                }
                StatusEvent::Activate => {
                    inventory.restore_defaults(device)?;
                    Vec::new()
                }
                _ => Vec::new(),
            };
            inventory.configuration_mut(device)?.status = step.status();
            self.reindex(&inventory, device);
            self.drop_peer_lists(&detached);
            (step, detached)
        };

        self.publish_peer_changes(&detached);
        let changes_document = matches!(
            event,
            StatusEvent::Modified(_) | StatusEvent::Deactivate | StatusEvent::Activate
        );
        let invalidated = if changes_document {
            self.cache.invalidate(device).await
        } else {
            Ok(())
        };
        self.publish(device, step, event);
        invalidated.map(|()| step.status())
    }

    /// Moves `devices` to `modified` and drops their checksums.
    ///
    /// Statuses are written first, checksums dropped second, events
    /// published last, even when some invalidations failed.
    async fn modify(&self, devices: &[DeviceId], reason: ModifiedReason) -> Result<(), CoreError> {
        if devices.is_empty() {
            return Ok(());
        }
        let event = StatusEvent::Modified(reason);
        let steps: Vec<(DeviceId, Transition)> = {
            let mut inventory = write(&self.inventory);
            devices
                .iter()
                .filter_map(|device| {
                    let active = inventory.device(device).ok()?.active;
                    let configuration = inventory.configuration_mut(device).ok()?;
                    let step = device_transition(active, configuration.status, &event).ok()?;
                    configuration.status = step.status();
                    Some((device.clone(), step))
                })
                .collect()
        };

        let invalidated = self.cache.invalidate_many(&event.to_string(), devices).await;
        for (device, step) in steps {
            self.publish(&device, step, event.clone());
        }
        invalidated.map(|_| ())
    }

    async fn change_templates<F>(&self, device: &DeviceId, compute: F) -> Result<(), CoreError>
    where
        F: FnOnce(TemplateOrderer<'_>, &Configuration, &OrgId) -> Result<Vec<TemplateId>, TemplateError>,
    {
        let change = {
            let mut inventory = write(&self.inventory);
            let organization = inventory.device(device)?.organization.clone();
            let templates = compute(
                inventory.orderer(),
                inventory.configuration(device)?,
                &organization,
            )?;
            let change = inventory.set_templates(device, templates)?;
            if change.changed {
                self.reindex(&inventory, device);
            }
            self.drop_peer_lists(&change.detached_clients);
            change
        };
        self.publish_peer_changes(&change.detached_clients);
        if change.changed {
            self.modify(slice::from_ref(device), ModifiedReason::Templates)
                .await?;
        }
        Ok(())
    }

    async fn edit_configuration<F>(
        &self,
        device: &DeviceId,
        reason: ModifiedReason,
        edit: F,
    ) -> Result<(), CoreError>
    where
        F: FnOnce(&mut Configuration) -> bool,
    {
        let changed = edit(write(&self.inventory).configuration_mut(device)?);
        if changed {
            self.modify(slice::from_ref(device), reason).await?;
        }
        Ok(())
    }

    /// Drops the cached peer lists of the servers `clients` left.
    ///
    /// Must be called while the inventory write lock is held, like every
    /// other peer registry update.
    fn drop_peer_lists(&self, clients: &[VpnClient]) {
        for client in clients {
            self.peers.on_client_detached(client);
        }
    }

    fn publish_peer_changes(&self, clients: &[VpnClient]) {
        for client in clients {
            self.events.publish(ConfigEvent::PeersChanged {
                server: client.server.clone(),
            });
        }
    }

    fn publish(&self, device: &DeviceId, step: Transition, reason: StatusEvent) {
        if let Transition::Changed { from, to } = step {
            info!("Configuration of device {device}: {from} -> {to} ({reason})");
            self.events.publish(ConfigEvent::StatusChanged {
                device: device.clone(),
                previous: from,
                current: to,
                reason,
            });
        }
    }

    /// Keeps the dependency index in step with the inventory.
    ///
    /// Must be called while the inventory write lock is held.
    fn reindex(&self, inventory: &Inventory, device: &DeviceId) {
        match inventory.dependencies(device) {
            Ok(dependencies) => self.cache.index().record(device, dependencies),
            Err(e) => {
                warn!("Dropping index entry of device {device}: {e}");
                self.cache.index().remove(device);
            }
        }
    }
}
