//! Configuration composition.
//!
//! This module provides:
//! - `{{variable}}` substitution backed by Handlebars ([`Substituter`])
//! - The associative merge rule for documents ([`merge`], [`dedupe_files`])
//! - Structural validation of merged documents ([`validate`])
//! - The VPN auto-client collaborator ([`AutoClient`], [`TunnelStanzaGenerator`])
//! - The render operation itself ([`ConfigComposer`], [`RenderInput`])
//! - Error handling ([`ComposeError`])
//!
//! Rendering is pure. Everything it needs is borrowed through [`RenderInput`]
//! and identical inputs always yield byte-identical output.

mod auto_client;
mod composer;
mod error;
mod merge;
mod schema;
mod substitute;

#[cfg(test)]
mod schema_tests;

pub use auto_client::{AutoClient, TunnelStanzaGenerator};
pub use composer::{ConfigComposer, RenderInput};
pub use error::ComposeError;
pub use merge::{dedupe_files, merge};
pub use schema::validate;
pub use substitute::{BASE_DOCUMENT, Substituter};
