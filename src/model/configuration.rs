//! Per-device configuration records.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Backend, Context, DeviceId, ModelError, TemplateId};

/// Lifecycle state of a device configuration.
///
/// See [`crate::status`] for the transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigStatus {
    /// Changed since the agent last applied it.
    #[default]
    Modified,
    /// The agent reported a successful apply.
    Applied,
    /// The agent reported a failure and rolled back.
    Error,
    /// Deactivation requested; the document has been emptied.
    Deactivating,
    /// The agent confirmed it stopped using the configuration.
    Deactivated,
}

impl ConfigStatus {
    /// Returns the lowercase wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Modified => "modified",
            Self::Applied => "applied",
            Self::Error => "error",
            Self::Deactivating => "deactivating",
            Self::Deactivated => "deactivated",
        }
    }

    /// Returns `true` for `deactivating` and `deactivated`.
    #[must_use]
    pub const fn is_deactivation(self) -> bool {
        matches!(self, Self::Deactivating | Self::Deactivated)
    }
}

impl fmt::Display for ConfigStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns an empty JSON object, the document of a fresh configuration.
#[must_use]
pub fn empty_document() -> Value {
    Value::Object(Map::new())
}

/// The configuration of a single device.
///
/// Holds the user-authored base document, the ordered template list and the
/// configuration's own variable context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Owning device.
    pub device: DeviceId,

    /// Backend shared by this configuration and all of its templates.
    pub backend: Backend,

    /// User-authored base document.
    #[serde(default = "empty_document")]
    pub document: Value,

    /// Ordered, de-duplicated template references.
    #[serde(default)]
    pub templates: Vec<TemplateId>,

    /// User-supplied variables.
    #[serde(default)]
    pub context: Context,

    /// Current lifecycle state.
    #[serde(default)]
    pub status: ConfigStatus,
}

impl Configuration {
    /// Creates an empty configuration in the `modified` state.
    #[must_use]
    pub fn new(device: impl Into<DeviceId>, backend: impl Into<Backend>) -> Self {
        Self {
            device: device.into(),
            backend: backend.into(),
            document: empty_document(),
            templates: Vec::new(),
            context: Context::new(),
            status: ConfigStatus::Modified,
        }
    }

    /// Sets the base document.
    #[must_use]
    pub fn with_document(mut self, document: Value) -> Self {
        self.document = document;
        self
    }

    /// Sets the explicit template selection.
    #[must_use]
    pub fn with_templates<I, T>(mut self, templates: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TemplateId>,
    {
        self.templates = templates.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the user context.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Returns `true` if the template is attached.
    #[must_use]
    pub fn has_template(&self, template: &TemplateId) -> bool {
        self.templates.contains(template)
    }

    /// Checks that the base document is a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NotAnObject`] otherwise.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.document.is_object() {
            return Ok(());
        }
        Err(ModelError::NotAnObject {
            field: "document",
            owner: self.device.to_string(),
        })
    }
}
