//! Structural validation of rendered documents.

use serde_json::Value;

use super::ComposeError;

/// Top-level sections that must be lists of objects.
const OBJECT_LISTS: &[&str] = &["interfaces", "files", "tunnels", "wireguard", "vxlan"];

/// Validates the generic structure of a merged document.
///
/// Backend-specific schemas are out of reach here; this only guarantees
/// what every backend relies on:
///
/// - the root is an object
/// - list sections contain objects
/// - interfaces are named
/// - files carry a `path`, `contents` and an octal `mode` if present
///
/// # Errors
///
/// Returns [`ComposeError::SchemaViolation`] for the first violation found.
pub fn validate(document: &Value) -> Result<(), ComposeError> {
    let Some(root) = document.as_object() else {
        return Err(violation("", "document must be an object"));
    };

    for &section in OBJECT_LISTS {
        let Some(value) = root.get(section) else {
            continue;
        };
        let Some(items) = value.as_array() else {
            return Err(violation(&format!("/{section}"), "must be a list"));
        };
        for (index, item) in items.iter().enumerate() {
            let path = format!("/{section}/{index}");
            if !item.is_object() {
                return Err(violation(&path, "must be an object"));
            }
            match section {
                "interfaces" => require_string(item, &path, "name")?,
                "files" => validate_file(item, &path)?,
                _ => {}
            }
        }
    }
    Ok(())
}

fn validate_file(file: &Value, path: &str) -> Result<(), ComposeError> {
    require_string(file, path, "path")?;
    require_string(file, path, "contents")?;
    match file.get("mode") {
        None => Ok(()),
        Some(Value::String(mode))
            if (3..=4).contains(&mode.len()) && mode.chars().all(|c| ('0'..='7').contains(&c)) =>
        {
            Ok(())
        }
        Some(_) => Err(violation(&format!("{path}/mode"), "must be an octal mode string")),
    }
}

fn require_string(item: &Value, path: &str, field: &str) -> Result<(), ComposeError> {
    match item.get(field) {
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(violation(&format!("{path}/{field}"), "must be a string")),
        None => Err(violation(&format!("{path}/{field}"), "is required")),
    }
}

fn violation(path: &str, reason: &str) -> ComposeError {
    ComposeError::SchemaViolation {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
