//! `{{variable}}` substitution.

use handlebars::{Handlebars, RenderErrorReason};
use serde_json::{Map, Value};

use crate::model::Context;

use super::ComposeError;

/// Source name used in errors raised while substituting the base document.
pub const BASE_DOCUMENT: &str = "configuration document";

/// Replaces `{{variable}}` placeholders in every string of a document.
///
/// Runs Handlebars in strict mode with escaping disabled: an unknown
/// variable is an error and values are inserted verbatim. Object keys are
/// substituted as well as values.
#[derive(Debug)]
pub struct Substituter {
    registry: Handlebars<'static>,
}

impl Default for Substituter {
    fn default() -> Self {
        Self::new()
    }
}

impl Substituter {
    /// Creates a strict, non-escaping substituter.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);
        Self { registry }
    }

    /// Substitutes `document` using `context`, falling back to `defaults`
    /// for names the context does not define.
    ///
    /// # Errors
    ///
    /// Returns [`ComposeError::MissingVariable`] if a placeholder is found
    /// in neither map, or [`ComposeError::InvalidPlaceholder`] for malformed
    /// expressions.
    pub fn substitute(
        &self,
        source_name: &str,
        document: &Value,
        context: &Context,
        defaults: &Context,
    ) -> Result<Value, ComposeError> {
        let mut data = Map::new();
        for (key, value) in defaults.iter().chain(context) {
            data.insert(key.clone(), Value::String(value.clone()));
        }
        let data = Value::Object(data);
        self.walk(source_name, document, &data)
    }

    fn walk(&self, source_name: &str, value: &Value, data: &Value) -> Result<Value, ComposeError> {
        match value {
            Value::String(s) => self.render(source_name, s, data).map(Value::String),
            Value::Array(items) => items
                .iter()
                .map(|item| self.walk(source_name, item, data))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut out = Map::new();
                for (key, item) in map {
                    out.insert(
                        self.render(source_name, key, data)?,
                        self.walk(source_name, item, data)?,
                    );
                }
                Ok(Value::Object(out))
            }
            other => Ok(other.clone()),
        }
    }

    fn render(&self, source_name: &str, text: &str, data: &Value) -> Result<String, ComposeError> {
        if !text.contains("{{") {
            return Ok(text.to_string());
        }
        self.registry
            .render_template(text, data)
            .map_err(|err| match err.reason() {
                RenderErrorReason::MissingVariable(name) => ComposeError::MissingVariable {
                    source_name: source_name.to_string(),
                    variable: name.clone().unwrap_or_else(|| text.to_string()),
                },
                _ => ComposeError::InvalidPlaceholder {
                    source_name: source_name.to_string(),
                    reason: err.to_string(),
                },
            })
    }
}
