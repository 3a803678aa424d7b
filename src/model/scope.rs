//! Organization and device-group scopes that contribute context variables.

use serde::{Deserialize, Serialize};

use super::{Context, GroupId, OrgId, TemplateId};

/// Per-organization settings consumed by the context resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationSettings {
    /// The organization these settings belong to.
    pub organization: OrgId,

    /// Organization-wide variables.
    #[serde(default)]
    pub context: Context,
}

impl OrganizationSettings {
    /// Creates settings with the given context.
    #[must_use]
    pub fn new(organization: impl Into<OrgId>, context: Context) -> Self {
        Self {
            organization: organization.into(),
            context,
        }
    }
}

/// A named group of devices within an organization.
///
/// Group templates are attached to every member device whose backend they
/// match. A device leaving the group loses them again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceGroup {
    /// Group identity.
    pub id: GroupId,

    /// Display name, unique within the organization.
    pub name: String,

    /// Owning organization.
    pub organization: OrgId,

    /// Group-wide variables.
    #[serde(default)]
    pub context: Context,

    /// Templates attached to the members, in selection order.
    #[serde(default)]
    pub templates: Vec<TemplateId>,
}

impl DeviceGroup {
    /// Creates a group with the given context.
    #[must_use]
    pub fn new(
        id: impl Into<GroupId>,
        name: impl Into<String>,
        organization: impl Into<OrgId>,
        context: Context,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            organization: organization.into(),
            context,
            templates: Vec::new(),
        }
    }

    /// Sets the group templates.
    #[must_use]
    pub fn with_templates<I, T>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TemplateId>,
    {
        self.templates = templates.into_iter().map(Into::into).collect();
        self
    }
}
