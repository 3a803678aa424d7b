//! The associative merge rule.

use std::collections::HashSet;

use serde_json::Value;

/// Merges `fragment` into `base`.
///
/// - object into object: deep merge, `fragment` keys win
/// - array into array: concatenation, `base` items first
/// - anything else: `fragment` replaces `base`
pub fn merge(base: &mut Value, fragment: Value) {
    match (base, fragment) {
        (Value::Object(base), Value::Object(fragment)) => {
            for (key, value) in fragment {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(base), Value::Array(fragment)) => base.extend(fragment),
        (base, fragment) => *base = fragment,
    }
}

/// Collapses identical entries of the top-level `files` list.
///
/// Templates sharing a file (a CA certificate, say) would otherwise ship it
/// several times. The first occurrence is kept.
pub fn dedupe_files(document: &mut Value) {
    let Some(Value::Array(files)) = document.get_mut("files") else {
        return;
    };
    let mut seen = HashSet::new();
    files.retain(|file| seen.insert(file.to_string()));
}
