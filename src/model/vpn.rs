//! VPN servers and client memberships.

use std::net::IpAddr;
use std::sync::{LazyLock, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Backend, DeviceId, ModelError, OrgId, VpnServerId, empty_document};

static SERVER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("server id pattern is valid"));

/// Validates a VPN server id.
///
/// The id is the suffix of every VPN context variable (`vpn_host_{id}`), so
/// it may only hold letters, digits, underscores and hyphens.
///
/// # Errors
///
/// Returns [`ModelError::InvalidIdentity`] for an empty id or one with any
/// other character.
pub fn validate_server_id(id: &VpnServerId) -> Result<(), ModelError> {
    if SERVER_ID.is_match(id.as_str()) {
        return Ok(());
    }
    Err(ModelError::InvalidIdentity {
        field: "VPN server id",
        value: id.to_string(),
        reason: "must only contain letters, digits, underscores or hyphens",
    })
}

/// Tunnel protocol family derived from a VPN server backend identifier.
///
/// Classification is substring based and case-insensitive, so customized
/// backends only need to keep the protocol name in their identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TunnelFamily {
    /// Any backend without a peer list (e.g. OpenVPN).
    Other,
    /// Plain WireGuard mesh.
    WireGuard,
    /// Plain VXLAN.
    Vxlan,
    /// VXLAN carried over WireGuard.
    VxlanOverWireGuard,
}

impl TunnelFamily {
    /// Classifies a backend identifier.
    #[must_use]
    pub fn classify(backend: &str) -> Self {
        let lower = backend.to_ascii_lowercase();
        match (lower.contains("wireguard"), lower.contains("vxlan")) {
            (true, true) => Self::VxlanOverWireGuard,
            (true, false) => Self::WireGuard,
            (false, true) => Self::Vxlan,
            (false, false) => Self::Other,
        }
    }

    /// Returns the short name used in generated stanzas.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Other => "other",
            Self::WireGuard => "wireguard",
            Self::Vxlan => "vxlan",
            Self::VxlanOverWireGuard => "vxlan-wireguard",
        }
    }

    /// Returns `true` if the server document embeds WireGuard peers.
    #[must_use]
    pub const fn uses_wireguard(self) -> bool {
        matches!(self, Self::WireGuard | Self::VxlanOverWireGuard)
    }

    /// Returns `true` if peers are identified by numeric tunnel ids.
    #[must_use]
    pub const fn uses_vxlan(self) -> bool {
        matches!(self, Self::Vxlan | Self::VxlanOverWireGuard)
    }

    /// Returns `true` for mesh backends that maintain a peer list.
    #[must_use]
    pub const fn is_mesh(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// A VPN server that devices may join.
#[derive(Debug, Serialize, Deserialize)]
pub struct VpnServer {
    /// Server identity.
    pub id: VpnServerId,

    /// Display name.
    pub name: String,

    /// Owning organization; `None` means shared.
    #[serde(default)]
    pub organization: Option<OrgId>,

    /// Tunnel backend identifier. Change it through [`Self::set_backend`].
    backend: Backend,

    /// The server's own configuration document.
    #[serde(default = "empty_document")]
    pub document: Value,

    /// Public host clients connect to.
    #[serde(default)]
    pub host: String,

    /// Server public key (WireGuard).
    #[serde(default)]
    pub public_key: Option<String>,

    /// Server private key (WireGuard), embedded into the server document.
    #[serde(default)]
    pub private_key: Option<String>,

    /// Server address inside the tunnel subnet.
    #[serde(default)]
    pub ip_address: Option<IpAddr>,

    #[serde(skip)]
    tunnel: OnceLock<TunnelFamily>,
}

impl Clone for VpnServer {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            organization: self.organization.clone(),
            backend: self.backend.clone(),
            document: self.document.clone(),
            host: self.host.clone(),
            public_key: self.public_key.clone(),
            private_key: self.private_key.clone(),
            ip_address: self.ip_address,
            tunnel: OnceLock::new(),
        }
    }
}

impl PartialEq for VpnServer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.organization == other.organization
            && self.backend == other.backend
            && self.document == other.document
            && self.host == other.host
            && self.public_key == other.public_key
            && self.private_key == other.private_key
            && self.ip_address == other.ip_address
    }
}

impl VpnServer {
    /// Creates a shared server with an empty document.
    #[must_use]
    pub fn new(
        id: impl Into<VpnServerId>,
        name: impl Into<String>,
        backend: impl Into<Backend>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            organization: None,
            backend: backend.into(),
            document: empty_document(),
            host: String::new(),
            public_key: None,
            private_key: None,
            ip_address: None,
            tunnel: OnceLock::new(),
        }
    }

    /// Sets the server document.
    #[must_use]
    pub fn with_document(mut self, document: Value) -> Self {
        self.document = document;
        self
    }

    /// Sets the public host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the WireGuard key pair.
    #[must_use]
    pub fn with_keys(mut self, public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self.private_key = Some(private_key.into());
        self
    }

    /// Sets the in-tunnel address.
    #[must_use]
    pub const fn with_ip_address(mut self, ip: IpAddr) -> Self {
        self.ip_address = Some(ip);
        self
    }

    /// Returns the backend identifier.
    #[must_use]
    pub const fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Replaces the backend and drops the memoized tunnel family.
    pub fn set_backend(&mut self, backend: impl Into<Backend>) {
        self.backend = backend.into();
        self.invalidate_local_cache();
    }

    /// Returns the tunnel family, classifying the backend on first use.
    pub fn tunnel_family(&self) -> TunnelFamily {
        *self
            .tunnel
            .get_or_init(|| TunnelFamily::classify(self.backend.as_str()))
    }

    /// Drops lazily computed per-instance values.
    pub fn invalidate_local_cache(&mut self) {
        self.tunnel = OnceLock::new();
    }

    /// Returns the VNI fixed at server level (`vxlan[0].vni`), if any.
    ///
    /// When set, clients share it instead of getting individual tunnel ids.
    pub fn server_vni(&self) -> Option<u32> {
        if !self.tunnel_family().uses_vxlan() {
            return None;
        }
        self.document
            .pointer("/vxlan/0/vni")
            .and_then(Value::as_u64)
            .and_then(|vni| u32::try_from(vni).ok())
    }

    /// Returns the VXLAN interface name (`vxlan[0].name`), if any.
    #[must_use]
    pub fn vxlan_interface(&self) -> Option<&str> {
        self.document.pointer("/vxlan/0/name").and_then(Value::as_str)
    }

    /// Returns the WireGuard listen port (`wireguard[0].port`), if any.
    #[must_use]
    pub fn wireguard_port(&self) -> Option<u64> {
        self.document.pointer("/wireguard/0/port").and_then(Value::as_u64)
    }

    /// Returns `true` if clients need an individually allocated tunnel id.
    pub fn uses_tunnel_ids(&self) -> bool {
        self.tunnel_family().uses_vxlan() && self.server_vni().is_none()
    }
}

/// Membership of one device's configuration in a VPN server.
///
/// Unique per (device, server) and, for tunnel-id backends, per (server, vni).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnClient {
    /// Member device.
    pub device: DeviceId,

    /// Joined server.
    pub server: VpnServerId,

    /// Client public key.
    #[serde(default)]
    pub public_key: Option<String>,

    /// Client private key, exposed to the device context.
    #[serde(default)]
    pub private_key: Option<String>,

    /// Address assigned inside the tunnel subnet.
    #[serde(default)]
    pub address: Option<IpAddr>,

    /// Numeric tunnel id (VNI) for VXLAN-style backends.
    #[serde(default)]
    pub vni: Option<u32>,

    /// Whether the client is managed automatically and advertised as a peer.
    #[serde(default = "auto_provisioned_by_default")]
    pub auto_provisioned: bool,
}

const fn auto_provisioned_by_default() -> bool {
    true
}

impl VpnClient {
    /// Creates an auto-provisioned client without keys or address.
    #[must_use]
    pub fn new(device: impl Into<DeviceId>, server: impl Into<VpnServerId>) -> Self {
        Self {
            device: device.into(),
            server: server.into(),
            public_key: None,
            private_key: None,
            address: None,
            vni: None,
            auto_provisioned: true,
        }
    }

    /// Sets the WireGuard key pair.
    #[must_use]
    pub fn with_keys(mut self, public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self.private_key = Some(private_key.into());
        self
    }

    /// Sets only the public key.
    #[must_use]
    pub fn with_public_key(mut self, public_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self
    }

    /// Sets the in-tunnel address.
    #[must_use]
    pub const fn with_address(mut self, address: IpAddr) -> Self {
        self.address = Some(address);
        self
    }

    /// Requests a specific tunnel id instead of an allocated one.
    #[must_use]
    pub const fn with_vni(mut self, vni: u32) -> Self {
        self.vni = Some(vni);
        self
    }

    /// Marks the client as manually managed; it is not advertised as a peer.
    #[must_use]
    pub const fn manual(mut self) -> Self {
        self.auto_provisioned = false;
        self
    }
}

/// A client together with the server it belongs to, as handed to renderers.
#[derive(Debug, Clone, Copy)]
pub struct VpnAttachment<'a> {
    /// The joined server.
    pub server: &'a VpnServer,
    /// The device's membership record.
    pub client: &'a VpnClient,
}
