//! Template selection and ordering.
//!
//! This module provides:
//! - The pure ordering function ([`sort_templates`])
//! - Required/default enforcement for every template-list mutation ([`TemplateOrderer`])
//! - Name uniqueness within an organization scope ([`check_unique_name`])
//! - Error handling ([`TemplateError`])

mod error;
mod orderer;

#[cfg(test)]
mod orderer_tests;

pub use error::TemplateError;
pub use orderer::{TemplateOrderer, check_unique_name, sort_templates};
