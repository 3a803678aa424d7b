//! Configuration lifecycle.
//!
//! This module provides:
//! - The pure transition function ([`transition`], [`StatusEvent`], [`Transition`])
//! - The reasons a configuration becomes modified ([`ModifiedReason`])
//! - The typed change notifications and their channel ([`ConfigEvent`], [`EventBus`])
//! - Error handling ([`StatusError`])

mod event;
mod machine;

#[cfg(test)]
mod event_tests;
#[cfg(test)]
mod machine_tests;

pub use event::{ConfigEvent, EventBus};
pub use machine::{
    ModifiedReason, StatusError, StatusEvent, Transition, device_transition, transition,
};
