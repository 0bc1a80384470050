//! `{field}` substitution for caller-supplied script header templates.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::model::Resources;

/// Render a header template, substituting each `{field}` placeholder with
/// the matching top-level [`Resources`] field.
///
/// `{{` and `}}` escape literal braces. An unknown or unclosed placeholder
/// is a configuration error; the built-in default header is never silently
/// substituted for a broken template.
pub fn render_header(template: &str, resources: &Resources) -> Result<String> {
    let fields = resource_fields(resources)?;

    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => {
                            return Err(Error::Template(format!(
                                "unclosed placeholder `{{{name}`"
                            )))
                        }
                    }
                }
                match fields.get(&name) {
                    Some(value) => out.push_str(value),
                    None => {
                        return Err(Error::Template(format!(
                            "unknown placeholder `{name}`"
                        )))
                    }
                }
            }
            _ => out.push(ch),
        }
    }
    Ok(out)
}

/// Top-level resource fields as template-substitutable strings, keyed by
/// their serialized (caller-facing) names.
fn resource_fields(resources: &Resources) -> Result<HashMap<String, String>> {
    let value =
        serde_json::to_value(resources).map_err(|e| Error::Template(e.to_string()))?;
    let Value::Object(map) = value else {
        return Err(Error::Template("resources did not serialize to a map".into()));
    };

    let mut fields = HashMap::with_capacity(map.len());
    for (key, value) in map {
        let text = match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };
        fields.insert(key, text);
    }
    Ok(fields)
}
