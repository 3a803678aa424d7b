//! Data model shared by every layer of the composition engine.
//!
//! This module provides:
//! - Strongly typed identifiers ([`DeviceId`], [`TemplateId`], [`VpnServerId`], ...)
//! - Managed devices and their configurations ([`Device`], [`Configuration`], [`ConfigStatus`])
//! - Reusable configuration fragments ([`Template`], [`TemplateKind`])
//! - VPN servers and their client attachments ([`VpnServer`], [`VpnClient`])
//! - Context-carrying scopes ([`OrganizationSettings`], [`DeviceGroup`])
//!
//! Records are plain data: they are owned by the storage collaborator
//! (see [`crate::inventory`]) and handed to the pure layers by reference.

mod configuration;
mod device;
mod error;
mod ids;
mod scope;
mod template;
mod vpn;

#[cfg(test)]
mod template_tests;

use std::collections::BTreeMap;

pub use configuration::{ConfigStatus, Configuration, empty_document};
pub use device::{Device, validate_device_name, validate_key, validate_mac_address};
pub use error::ModelError;
pub use ids::{Backend, DeviceId, GroupId, OrgId, TemplateId, VpnServerId};
pub use scope::{DeviceGroup, OrganizationSettings};
pub use template::{Template, TemplateKind};
pub use vpn::{TunnelFamily, VpnAttachment, VpnClient, VpnServer, validate_server_id};

/// Flat variable table used for `{{variable}}` substitution.
///
/// A `BTreeMap` keeps iteration order sorted, so anything derived from a
/// context (rendered documents, checksums) is deterministic.
pub type Context = BTreeMap<String, String>;
