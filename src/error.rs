//! Crate-level error type.

use std::fmt;

use thiserror::Error;

use crate::cache::CacheError;
use crate::compose::ComposeError;
use crate::model::ModelError;
use crate::status::StatusError;
use crate::template::TemplateError;
use crate::vpn::VpnError;

/// Error type returned by the public operations of the crate.
///
/// Wraps the error of the layer that failed. Use [`CoreError::kind`] to
/// branch on the failure category without matching nested enums.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A record failed validation.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A template-list mutation was rejected.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Rendering failed.
    #[error(transparent)]
    Compose(#[from] ComposeError),

    /// The checksum store failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A status transition was rejected.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// A VPN membership change was rejected.
    #[error(transparent)]
    Vpn(#[from] VpnError),

    /// An id does not resolve to a record.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of record (`device`, `template`, ...)
        entity: &'static str,
        /// The unknown id
        id: String,
    },

    /// An id is already taken by another record.
    #[error("{entity} '{id}' already exists")]
    AlreadyExists {
        /// Kind of record
        entity: &'static str,
        /// The duplicate id
        id: String,
    },
}

impl CoreError {
    /// Creates a [`CoreError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates a [`CoreError::AlreadyExists`].
    pub fn already_exists(entity: &'static str, id: impl fmt::Display) -> Self {
        Self::AlreadyExists {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Model(e) => match e {
                ModelError::InvalidIdentity { .. } => ErrorKind::InvalidIdentity,
                ModelError::UnknownVpnServer { .. } => ErrorKind::NotFound,
                ModelError::MissingVpnServer { .. } | ModelError::NotAnObject { .. } => {
                    ErrorKind::SchemaViolation
                }
            },
            Self::Template(e) => match e {
                TemplateError::NotFound(_) => ErrorKind::NotFound,
                TemplateError::BackendMismatch { .. } => ErrorKind::BackendMismatch,
                TemplateError::OrganizationMismatch { .. } => ErrorKind::OrganizationMismatch,
                TemplateError::RequiredTemplateViolation { .. } => {
                    ErrorKind::RequiredTemplateViolation
                }
                TemplateError::DuplicateName { .. } => ErrorKind::DuplicateName,
            },
            Self::Compose(e) => match e {
                ComposeError::MissingVariable { .. } => ErrorKind::MissingVariable,
                ComposeError::BackendMismatch { .. } => ErrorKind::BackendMismatch,
                ComposeError::UnknownTemplate(_) => ErrorKind::NotFound,
                ComposeError::InvalidPlaceholder { .. }
                | ComposeError::SchemaViolation { .. }
                | ComposeError::Encode(_) => ErrorKind::SchemaViolation,
            },
            Self::Cache(_) => ErrorKind::CacheUnavailable,
            Self::Status(_) => ErrorKind::InvalidTransition,
            Self::Vpn(e) => match e {
                VpnError::DuplicateVpnClient { .. } | VpnError::DuplicateTunnelId { .. } => {
                    ErrorKind::DuplicateVpnClient
                }
                VpnError::TunnelIdExhausted { .. } => ErrorKind::TunnelIdExhausted,
                VpnError::TunnelIdOutOfRange { .. } => ErrorKind::SchemaViolation,
                VpnError::UnknownServer(_) => ErrorKind::NotFound,
            },
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
        }
    }
}

/// Failure categories of [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A placeholder could not be resolved.
    MissingVariable,
    /// A document or record is structurally invalid.
    SchemaViolation,
    /// A template and a configuration disagree on the backend.
    BackendMismatch,
    /// A required template would be removed.
    RequiredTemplateViolation,
    /// A VPN membership or tunnel id is already taken.
    DuplicateVpnClient,
    /// No tunnel id is left.
    TunnelIdExhausted,
    /// An id does not resolve.
    NotFound,
    /// A template is used outside its organization.
    OrganizationMismatch,
    /// A status change is not allowed.
    InvalidTransition,
    /// A device identity field is malformed.
    InvalidIdentity,
    /// A template name is already taken in its scope.
    DuplicateName,
    /// An id is already taken.
    AlreadyExists,
    /// The checksum store failed.
    CacheUnavailable,
}

impl ErrorKind {
    /// Returns `true` for errors caused by bad input data.
    ///
    /// These are never worth retrying.
    #[must_use]
    pub const fn is_invalid_input(self) -> bool {
        !matches!(self, Self::CacheUnavailable | Self::NotFound)
    }
}
