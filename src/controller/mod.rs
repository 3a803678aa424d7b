//! The facade collaborators talk to.
//!
//! This module provides:
//! - [`Controller`]: render, checksum, invalidation, status, VPN and
//!   mutation entry points kept coherent with each other
//! - [`ControllerBuilder`]: settings and wiring
//! - [`InventoryDocuments`]: the document source the checksum cache renders through

mod builder;
mod documents;
mod engine;


pub use builder::{ControllerBuilder, DEFAULT_CHECKSUM_TTL, DEFAULT_TUNNEL_ID_MAX};
pub use documents::{InventoryDocuments, SharedInventory};
pub use engine::Controller;
