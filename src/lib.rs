//! devconf: device configuration composition engine
//!
//! Renders device configurations from ordered templates and a layered
//! variable context, caches their checksums coherently across every kind of
//! edit, tracks the configuration status reported by agents and keeps the
//! peer lists of mesh VPN servers current.
//!
//! [`controller::Controller`] is the entry point; the other modules are its
//! building blocks.

pub mod cache;
pub mod compose;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod inventory;
pub mod model;
pub mod state;
pub mod status;
pub mod template;
pub mod time;
pub mod vpn;
