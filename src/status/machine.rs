//! Status transition rules.

use std::fmt;

use thiserror::Error;

use crate::model::{ConfigStatus, TemplateId, VpnServerId};

/// Why a configuration became modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModifiedReason {
    /// The base document changed.
    Document,
    /// The template list changed.
    Templates,
    /// The configuration's own context changed.
    Context,
    /// The backend changed.
    Backend,
    /// An attached template's content changed.
    TemplateContent(TemplateId),
    /// The device's name, group or identity changed.
    DeviceIdentity,
    /// A joined VPN server's document changed.
    VpnServer(VpnServerId),
    /// The VPN memberships changed.
    VpnMembership(VpnServerId),
    /// Requested explicitly by an operator.
    Manual,
}

impl fmt::Display for ModifiedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => f.write_str("document changed"),
            Self::Templates => f.write_str("templates changed"),
            Self::Context => f.write_str("context changed"),
            Self::Backend => f.write_str("backend changed"),
            Self::TemplateContent(id) => write!(f, "template {id} changed"),
            Self::DeviceIdentity => f.write_str("device changed"),
            Self::VpnServer(id) => write!(f, "VPN server {id} changed"),
            Self::VpnMembership(id) => write!(f, "membership of VPN server {id} changed"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

/// Signals that drive the lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// The agent applied the configuration.
    AgentApplied,
    /// The agent failed to apply the configuration.
    AgentFailed,
    /// Something the rendered output depends on changed.
    Modified(ModifiedReason),
    /// Deactivation was requested.
    Deactivate,
    /// The agent stopped polling, or deactivation was force-confirmed.
    ConfirmDeactivation,
    /// A deactivated device is reactivated.
    Activate,
}

impl StatusEvent {
    /// Returns a short name for logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AgentApplied => "applied",
            Self::AgentFailed => "error",
            Self::Modified(_) => "modified",
            Self::Deactivate => "deactivate",
            Self::ConfirmDeactivation => "confirm deactivation",
            Self::Activate => "activate",
        }
    }
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modified(reason) => write!(f, "modified ({reason})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Outcome of applying an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The status changes.
    Changed {
        /// Status before the event
        from: ConfigStatus,
        /// Status after the event
        to: ConfigStatus,
    },
    /// The event is accepted but the status stays.
    Unchanged(ConfigStatus),
}

impl Transition {
    /// Returns the resulting status.
    #[must_use]
    pub const fn status(self) -> ConfigStatus {
        match self {
            Self::Changed { to, .. } => to,
            Self::Unchanged(status) => status,
        }
    }

    /// Returns `true` if the status changes.
    #[must_use]
    pub const fn is_change(self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

/// Error type for illegal transitions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StatusError {
    /// The event is not allowed in the current state.
    #[error("Cannot apply '{event}' to a configuration in status '{from}'")]
    InvalidTransition {
        /// Current status
        from: ConfigStatus,
        /// Rejected event name
        event: &'static str,
    },
}

/// Applies `event` to `current`.
///
/// | event | from | to |
/// |---|---|---|
/// | agent applied | modified, error | applied |
/// | agent failed | any | error |
/// | modified | applied, error | modified |
/// | deactivate | modified, applied, error | deactivating |
/// | confirm deactivation | deactivating | deactivated |
/// | activate | deactivated | modified |
///
/// Repeating an event in its target state is accepted without a change.
/// A modification of a configuration that is deactivating or deactivated
/// is ignored.
///
/// # Errors
///
/// Returns [`StatusError::InvalidTransition`] for any other combination.
pub fn transition(current: ConfigStatus, event: &StatusEvent) -> Result<Transition, StatusError> {
    use ConfigStatus::{Applied, Deactivated, Deactivating, Error, Modified};

    let target = match (event, current) {
        (StatusEvent::AgentApplied, Modified | Error | Applied) => Applied,
        (StatusEvent::AgentFailed, _) => Error,
        (StatusEvent::Modified(_), Deactivating | Deactivated) => current,
        (StatusEvent::Modified(_), _) => Modified,
        (StatusEvent::Deactivate, Modified | Applied | Error | Deactivating) => Deactivating,
        (StatusEvent::ConfirmDeactivation, Deactivating | Deactivated) => Deactivated,
        (StatusEvent::Activate, Deactivated) => Modified,
        _ => {
            return Err(StatusError::InvalidTransition {
                from: current,
                event: event.name(),
            });
        }
    };
    Ok(changed_or_same(current, target))
}

/// Applies `event` to the configuration of a device that is `active` or not.
///
/// Active devices follow [`transition`]. An inactive device stays
/// deactivated until it is activated again:
///
/// - an agent failure is still recorded as `error`
/// - modifications are ignored
/// - an agent success report is rejected
/// - activation is accepted from `error` as well as from `deactivated`
///
/// # Errors
///
/// Returns [`StatusError::InvalidTransition`] for a rejected combination.
pub fn device_transition(
    active: bool,
    current: ConfigStatus,
    event: &StatusEvent,
) -> Result<Transition, StatusError> {
    if active {
        return transition(current, event);
    }
    match (event, current) {
        (StatusEvent::Modified(_), _) => Ok(Transition::Unchanged(current)),
        (StatusEvent::AgentApplied, _) => Err(StatusError::InvalidTransition {
            from: current,
            event: event.name(),
        }),
        (StatusEvent::Activate, ConfigStatus::Error) => {
            Ok(changed_or_same(current, ConfigStatus::Modified))
        }
        _ => transition(current, event),
    }
}

fn changed_or_same(from: ConfigStatus, to: ConfigStatus) -> Transition {
    if from == to {
        Transition::Unchanged(from)
    } else {
        Transition::Changed { from, to }
    }
}
