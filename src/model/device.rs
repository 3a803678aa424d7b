//! Managed device records and identity validation.

use std::net::IpAddr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{DeviceId, GroupId, ModelError, OrgId};

const MAC_ADDRESS_PATTERN: &str = "^([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})$";

const HOSTNAME_PATTERN: &str = r"^([a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])(\.([a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9\-]{0,61}[a-zA-Z0-9]))*$";

static MAC_ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MAC_ADDRESS_PATTERN).expect("MAC address pattern is valid"));

static HOSTNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(HOSTNAME_PATTERN).expect("hostname pattern is valid"));

static KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s/.]+$").expect("key pattern is valid"));

/// A managed network device.
///
/// A device owns at most one [`Configuration`](super::Configuration),
/// keyed by the same [`DeviceId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Unique identity.
    pub id: DeviceId,

    /// Shared secret used by the agent when polling.
    pub key: String,

    /// Hostname or MAC address shown to operators.
    pub name: String,

    /// Primary MAC address.
    pub mac_address: String,

    /// Owning organization.
    pub organization: OrgId,

    /// Optional device group.
    #[serde(default)]
    pub group: Option<GroupId>,

    /// Last IP address the device was seen polling from.
    #[serde(default)]
    pub last_ip: Option<IpAddr>,

    /// Management IP address.
    #[serde(default)]
    pub management_ip: Option<IpAddr>,

    /// Optional hardware identifier exposed as the `hardware_id` variable.
    #[serde(default)]
    pub hardware_id: Option<String>,

    /// Lifecycle flag; `false` once the device has been deactivated.
    #[serde(default = "active_by_default")]
    pub active: bool,
}

const fn active_by_default() -> bool {
    true
}

impl Device {
    /// Creates an active device without group or addresses.
    #[must_use]
    pub fn new(
        id: impl Into<DeviceId>,
        key: impl Into<String>,
        name: impl Into<String>,
        mac_address: impl Into<String>,
        organization: impl Into<OrgId>,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            name: name.into(),
            mac_address: mac_address.into(),
            organization: organization.into(),
            group: None,
            last_ip: None,
            management_ip: None,
            hardware_id: None,
            active: true,
        }
    }

    /// Places the device in a group.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<GroupId>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Sets the hardware identifier.
    #[must_use]
    pub fn with_hardware_id(mut self, hardware_id: impl Into<String>) -> Self {
        self.hardware_id = Some(hardware_id.into());
        self
    }

    /// Sets the management IP address.
    #[must_use]
    pub const fn with_management_ip(mut self, ip: IpAddr) -> Self {
        self.management_ip = Some(ip);
        self
    }

    /// Validates the identity fields (`key`, `name`, `mac_address`).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidIdentity`] for the first invalid field.
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_key(&self.key)?;
        validate_device_name(&self.name)?;
        validate_mac_address(&self.mac_address)
    }

    /// Returns `true` if a change from `previous` to `self` affects the
    /// rendered configuration (name and group feed the context).
    #[must_use]
    pub fn affects_configuration(&self, previous: &Self) -> bool {
        self.name != previous.name
            || self.group != previous.group
            || self.key != previous.key
            || self.mac_address != previous.mac_address
            || self.hardware_id != previous.hardware_id
            || self.organization != previous.organization
    }
}

/// Validates a MAC address (`aa:bb:cc:dd:ee:ff` or `aa-bb-cc-dd-ee-ff`).
///
/// # Errors
///
/// Returns [`ModelError::InvalidIdentity`] if the format does not match.
pub fn validate_mac_address(value: &str) -> Result<(), ModelError> {
    if MAC_ADDRESS.is_match(value) {
        return Ok(());
    }
    Err(ModelError::InvalidIdentity {
        field: "mac_address",
        value: value.to_string(),
        reason: "must be a valid mac address",
    })
}

/// Validates a device name: either a hostname or a MAC address.
///
/// # Errors
///
/// Returns [`ModelError::InvalidIdentity`] if neither form matches.
pub fn validate_device_name(value: &str) -> Result<(), ModelError> {
    if HOSTNAME.is_match(value) || MAC_ADDRESS.is_match(value) {
        return Ok(());
    }
    Err(ModelError::InvalidIdentity {
        field: "name",
        value: value.to_string(),
        reason: "must be either a valid hostname or mac address",
    })
}

/// Validates a device key: no whitespace, dots or slashes.
///
/// # Errors
///
/// Returns [`ModelError::InvalidIdentity`] if the key is empty or contains
/// a forbidden character.
pub fn validate_key(value: &str) -> Result<(), ModelError> {
    if KEY.is_match(value) {
        return Ok(());
    }
    Err(ModelError::InvalidIdentity {
        field: "key",
        value: value.to_string(),
        reason: "must not contain spaces, dots or slashes",
    })
}
