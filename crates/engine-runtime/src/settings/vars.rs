use crate::settings::error::SettingsError;
use serde_json::Value;
use std::collections::HashMap;

/// Replaces `${NAME}` placeholders in every string of `value`.
///
/// Substitution happens on the parsed document, so substituted text never
/// changes the JSON structure. `$$` escapes a literal dollar sign.
pub fn substitute(value: &mut Value, vars: &HashMap<String, String>) -> Result<(), SettingsError> {
    match value {
        Value::String(s) => {
            if s.contains('$') {
                *s = expand(s, vars)?;
            }
        }
        Value::Array(items) => {
            for item in items {
                substitute(item, vars)?;
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                substitute(item, vars)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn expand(input: &str, vars: &HashMap<String, String>) -> Result<String, SettingsError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
        } else if let Some(body) = after.strip_prefix('{') {
            let end = body
                .find('}')
                .ok_or_else(|| SettingsError::UnterminatedPlaceholder(input.to_string()))?;
            let name = body[..end].trim();
            let value = vars
                .get(name)
                .ok_or_else(|| SettingsError::UnresolvedVariable(name.to_string()))?;
            out.push_str(value);
            rest = &body[end + 1..];
        } else {
            out.push('$');
            rest = after;
        }
    }

    out.push_str(rest);
    Ok(out)
}
