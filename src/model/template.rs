//! Reusable configuration fragments.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Backend, Context, ModelError, OrgId, TemplateId, VpnServerId, empty_document};

/// What a template provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// Plain configuration content.
    #[default]
    Generic,
    /// VPN client content; the VPN backend appends tunnel stanzas.
    Vpn,
}

/// A named, reusable unit of configuration content.
///
/// # Flags
///
/// - `required`: always attached to every configuration of the same backend
///   within scope; cannot be detached. Implies `default`.
/// - `default`: attached automatically to configurations created without an
///   explicit template list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Template identity.
    pub id: TemplateId,

    /// Name, unique within the organization scope.
    pub name: String,

    /// Owning organization; `None` means shared by every organization.
    #[serde(default)]
    pub organization: Option<OrgId>,

    /// Backend this template targets.
    pub backend: Backend,

    /// Template type.
    #[serde(default, rename = "type")]
    pub kind: TemplateKind,

    /// VPN server, only for [`TemplateKind::Vpn`].
    #[serde(default)]
    pub vpn: Option<VpnServerId>,

    /// Cannot be removed from configurations in scope.
    #[serde(default)]
    pub required: bool,

    /// Attached automatically to new configurations.
    #[serde(default)]
    pub default: bool,

    /// Configuration fragment.
    #[serde(default = "empty_document")]
    pub document: Value,

    /// Fallback values for placeholders not found in the resolved context.
    #[serde(default)]
    pub default_values: Context,

    /// Creation sequence number, assigned by the inventory.
    #[serde(default)]
    pub created: u64,
}

impl Template {
    /// Creates a shared generic template with an empty document.
    #[must_use]
    pub fn new(
        id: impl Into<TemplateId>,
        name: impl Into<String>,
        backend: impl Into<Backend>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            organization: None,
            backend: backend.into(),
            kind: TemplateKind::Generic,
            vpn: None,
            required: false,
            default: false,
            document: empty_document(),
            default_values: Context::new(),
            created: 0,
        }
    }

    /// Sets the configuration fragment.
    #[must_use]
    pub fn with_document(mut self, document: Value) -> Self {
        self.document = document;
        self
    }

    /// Sets the placeholder fallback values.
    #[must_use]
    pub fn with_default_values(mut self, values: Context) -> Self {
        self.default_values = values;
        self
    }

    /// Restricts the template to one organization.
    #[must_use]
    pub fn owned_by(mut self, organization: impl Into<OrgId>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Flags the template as required (and therefore default).
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self.default = true;
        self
    }

    /// Flags the template as enabled by default.
    #[must_use]
    pub const fn enabled_by_default(mut self) -> Self {
        self.default = true;
        self
    }

    /// Turns the template into a VPN client template for `server`.
    #[must_use]
    pub fn vpn_client_of(mut self, server: impl Into<VpnServerId>) -> Self {
        self.kind = TemplateKind::Vpn;
        self.vpn = Some(server.into());
        self
    }

    /// Sets the creation sequence number.
    #[must_use]
    pub const fn created_at(mut self, sequence: u64) -> Self {
        self.created = sequence;
        self
    }

    /// Returns `true` for VPN client templates.
    #[must_use]
    pub const fn is_vpn(&self) -> bool {
        matches!(self.kind, TemplateKind::Vpn)
    }

    /// Returns `true` if configurations of `organization` may use this template.
    #[must_use]
    pub fn is_visible_to(&self, organization: &OrgId) -> bool {
        self.organization
            .as_ref()
            .is_none_or(|owner| owner == organization)
    }

    /// Returns `true` if the template is mandatory for a configuration with
    /// the given backend and organization.
    #[must_use]
    pub fn is_required_for(&self, backend: &Backend, organization: &OrgId) -> bool {
        self.required && &self.backend == backend && self.is_visible_to(organization)
    }

    /// Returns `true` if the template is auto-attached to a new configuration
    /// with the given backend and organization.
    #[must_use]
    pub fn is_default_for(&self, backend: &Backend, organization: &OrgId) -> bool {
        (self.default || self.required)
            && &self.backend == backend
            && self.is_visible_to(organization)
    }

    /// Returns `true` if the rendered output of configurations using this
    /// template may differ between `previous` and `self`.
    #[must_use]
    pub fn content_differs(&self, previous: &Self) -> bool {
        self.backend != previous.backend
            || self.document != previous.document
            || self.default_values != previous.default_values
            || self.kind != previous.kind
            || self.vpn != previous.vpn
    }

    /// Normalizes flags and validates the VPN link.
    ///
    /// - `required` forces `default`
    /// - VPN templates must reference a server
    /// - generic templates drop any server reference
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingVpnServer`] for a VPN template without server,
    /// or [`ModelError::NotAnObject`] if the document is not an object.
    pub fn normalize(mut self) -> Result<Self, ModelError> {
        if self.required {
            self.default = true;
        }
        match self.kind {
            TemplateKind::Vpn if self.vpn.is_none() => {
                return Err(ModelError::MissingVpnServer { template: self.id });
            }
            TemplateKind::Generic => self.vpn = None,
            TemplateKind::Vpn => {}
        }
        if !self.document.is_object() {
            return Err(ModelError::NotAnObject {
                field: "document",
                owner: self.id.to_string(),
            });
        }
        Ok(self)
    }
}
