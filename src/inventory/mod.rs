//! Record storage for the composition engine.
//!
//! The [`Inventory`] owns devices, configurations, templates, VPN servers
//! and their clients, organization settings and device groups. It enforces
//! the record-level invariants (unique ids and names, backend and
//! organization scoping, unique VPN memberships and tunnel ids) and hands
//! borrowed [`RenderInput`](crate::compose::RenderInput) snapshots to the
//! composer.

mod catalog;


pub use catalog::{GroupChange, Inventory, RemovedDevice, TemplateChange};
