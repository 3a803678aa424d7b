//! Layered context resolution.

use crate::model::{Configuration, Context, Device, VpnAttachment};

/// Borrowed inputs for one resolution.
///
/// Missing scopes (no organization settings, no group) are `None` and
/// resolve as empty maps.
#[derive(Debug, Clone, Copy)]
pub struct ContextSources<'a> {
    /// The device the configuration belongs to.
    pub device: &'a Device,
    /// The configuration being rendered.
    pub configuration: &'a Configuration,
    /// Organization-wide variables.
    pub organization: Option<&'a Context>,
    /// Device-group variables.
    pub group: Option<&'a Context>,
    /// VPN memberships of the configuration.
    pub vpn: &'a [VpnAttachment<'a>],
}

/// Merges variable scopes into one flat table.
///
/// Precedence, lowest to highest:
///
/// 1. process-wide global context
/// 2. organization settings
/// 3. device group
/// 4. the configuration's own context
/// 5. VPN-derived variables (`vpn_host_<server>`, `pub_key_<server>`, ...)
/// 6. device identity (`id`, `key`, `name`, `mac_address`, `hardware_id`)
///
/// Identity variables are written last and can never be overridden.
/// Resolution is pure: identical inputs always produce identical output.
#[derive(Debug, Clone, Default)]
pub struct ContextResolver {
    global: Context,
}

impl ContextResolver {
    /// Creates a resolver with the given process-wide context.
    #[must_use]
    pub const fn new(global: Context) -> Self {
        Self { global }
    }

    /// Returns the process-wide context.
    #[must_use]
    pub const fn global(&self) -> &Context {
        &self.global
    }

    /// Resolves the flat variable table for one configuration.
    #[must_use]
    pub fn resolve(&self, sources: &ContextSources<'_>) -> Context {
        let mut context = self.global.clone();
        for layer in [sources.organization, sources.group].into_iter().flatten() {
            extend(&mut context, layer);
        }
        extend(&mut context, &sources.configuration.context);
        context.extend(vpn_variables(sources.vpn));
        context.extend(identity_variables(sources.device));
        context
    }
}

fn extend(context: &mut Context, layer: &Context) {
    context.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
}

/// Returns the built-in device identity variables.
#[must_use]
pub fn identity_variables(device: &Device) -> Context {
    let mut vars = Context::new();
    vars.insert("id".to_string(), device.id.to_string());
    vars.insert("key".to_string(), device.key.clone());
    vars.insert("name".to_string(), device.name.clone());
    vars.insert("mac_address".to_string(), device.mac_address.clone());
    if let Some(hardware_id) = &device.hardware_id {
        vars.insert("hardware_id".to_string(), hardware_id.clone());
    }
    vars
}

/// Returns the variables contributed by VPN memberships, keyed by server id.
#[must_use]
pub fn vpn_variables(attachments: &[VpnAttachment<'_>]) -> Context {
    let mut vars = Context::new();
    for VpnAttachment { server, client } in attachments {
        let family = server.tunnel_family();
        let mut put = |prefix: &str, value: String| {
            vars.insert(format!("{prefix}_{}", server.id), value);
        };

        if !server.host.is_empty() {
            put("vpn_host", server.host.clone());
        }
        if family.uses_wireguard() {
            if let Some(port) = server.wireguard_port() {
                put("vpn_port", port.to_string());
            }
            if let Some(key) = &server.public_key {
                put("public_key", key.clone());
            }
            if let Some(key) = &client.public_key {
                put("pub_key", key.clone());
            }
            if let Some(key) = &client.private_key {
                put("pvt_key", key.clone());
            }
        }
        if family.uses_vxlan() {
            if let Some(vni) = client.vni.or_else(|| server.server_vni()) {
                put("vni", vni.to_string());
            }
        }
        if let Some(address) = client.address {
            put("ip_address", address.to_string());
        }
        if let Some(address) = server.ip_address {
            put("server_ip_address", address.to_string());
        }
    }
    vars
}
