//! Error types for template-list mutations.

use thiserror::Error;

use crate::model::{Backend, OrgId, TemplateId};

/// Error type for rejected template selections.
///
/// Every variant is raised before the mutation is committed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// The template id is unknown.
    #[error("Template '{0}' not found")]
    NotFound(TemplateId),

    /// The template targets another backend than the configuration.
    #[error("Template '{template}' uses backend '{found}', configuration uses '{expected}'")]
    BackendMismatch {
        /// The offending template
        template: TemplateId,
        /// The configuration backend
        expected: Backend,
        /// The template backend
        found: Backend,
    },

    /// The template belongs to another organization.
    #[error("Template '{template}' is not available to organization '{organization}'")]
    OrganizationMismatch {
        /// The offending template
        template: TemplateId,
        /// The configuration's organization
        organization: OrgId,
    },

    /// A required template would be removed.
    #[error("Template '{template}' is required and cannot be removed")]
    RequiredTemplateViolation {
        /// The required template
        template: TemplateId,
    },

    /// Another template in the same scope already uses this name.
    #[error("A template named '{name}' already exists in this organization")]
    DuplicateName {
        /// The conflicting name
        name: String,
    },
}
