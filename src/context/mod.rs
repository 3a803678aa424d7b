//! Variable context resolution.
//!
//! Flattens the global, organization, group, configuration, VPN and device
//! identity scopes into the single table used for `{{variable}}`
//! substitution. See [`ContextResolver`] for the precedence rules.

mod resolver;

#[cfg(test)]
mod resolver_tests;

pub use resolver::{ContextResolver, ContextSources, identity_variables, vpn_variables};
