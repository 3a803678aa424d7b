//! Error types for composition.

use thiserror::Error;

use crate::model::{Backend, TemplateId};
use crate::template::TemplateError;

/// Error type for a failed render.
///
/// All variants describe bad input data. None of them is retried and a
/// failed render never writes to the checksum cache.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// A placeholder has no value in the context nor in the template defaults.
    #[error("Missing variable '{variable}' in {source_name}")]
    MissingVariable {
        /// Template id, or the base document marker
        source_name: String,
        /// The unresolved placeholder
        variable: String,
    },

    /// A placeholder expression could not be parsed or evaluated.
    #[error("Invalid placeholder in {source_name}: {reason}")]
    InvalidPlaceholder {
        /// Template id, or the base document marker
        source_name: String,
        /// Parser or renderer message
        reason: String,
    },

    /// The merged document fails structural validation.
    #[error("Schema violation at '{path}': {reason}")]
    SchemaViolation {
        /// JSON pointer of the offending value
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// A template targets another backend than the configuration.
    #[error("Template '{template}' uses backend '{found}', configuration uses '{expected}'")]
    BackendMismatch {
        /// The offending template
        template: TemplateId,
        /// The configuration backend
        expected: Backend,
        /// The template backend
        found: Backend,
    },

    /// The configuration references a template that does not exist.
    #[error("Template '{0}' not found")]
    UnknownTemplate(TemplateId),

    /// Serializing the rendered document failed.
    #[error("Failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),
}

impl From<TemplateError> for ComposeError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::BackendMismatch {
                template,
                expected,
                found,
            } => Self::BackendMismatch {
                template,
                expected,
                found,
            },
            TemplateError::NotFound(id) => Self::UnknownTemplate(id),
            other => Self::SchemaViolation {
                path: "/templates".to_string(),
                reason: other.to_string(),
            },
        }
    }
}
