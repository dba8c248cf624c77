use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::{classify::FunctionName, types::hook::Hook};

/// Serializes a JSON value deterministically: object keys are emitted in
/// sorted order at every level, so byte-identical inputs always hash the
/// same regardless of how the map was built.
#[must_use]
pub fn stable_json(value: &Value) -> String {
    let mut out = String::new();
    write_stable(value, &mut out);
    out
}

fn write_stable(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_stable(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_stable(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for byte in digest {
        use std::fmt::Write;
        write!(out, "{byte:02x}").expect("writing to a String never fails");
    }
    out
}

/// Request-cache key: `SHA-256(functionName + "-" + JSON(requestBody))`.
#[must_use]
pub fn request_fingerprint(function: FunctionName, body: &Value) -> String {
    sha256_hex(&format!("{}-{}", function.as_ref(), stable_json(body)))
}

/// Hook-cache key:
/// `SHA-256(functionName + "-" + JSON(hook) + "-" + JSON(requestBody)
///  + "-" + JSON(responseBody?))`.
#[must_use]
pub fn hook_fingerprint(
    function: FunctionName,
    hook: &Hook,
    request_body: &Value,
    response_body: Option<&Value>,
) -> String {
    let hook_json = serde_json::to_value(hook)
        .map(|v| stable_json(&v))
        .unwrap_or_default();
    let mut input = format!(
        "{}-{}-{}",
        function.as_ref(),
        hook_json,
        stable_json(request_body)
    );
    if let Some(response_body) = response_body {
        input.push('-');
        input.push_str(&stable_json(response_body));
    }
    sha256_hex(&input)
}

/// SHA-256 over the deterministic serialization of a declared tool,
/// used to record each tool once per agent.
#[must_use]
pub fn tool_hash(tool: &Value) -> String {
    sha256_hex(&stable_json(tool))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn stable_json_sorts_keys_recursively() {
        let a = json!({"b": 1, "a": {"d": 2, "c": 3}});
        let b = json!({"a": {"c": 3, "d": 2}, "b": 1});
        assert_eq!(stable_json(&a), stable_json(&b));
        assert_eq!(stable_json(&a), r#"{"a":{"c":3,"d":2},"b":1}"#);
    }

    #[test]
    fn identical_bodies_produce_identical_fingerprints() {
        let body = json!({"model": "m", "messages": [{"role": "user"}]});
        assert_eq!(
            request_fingerprint(FunctionName::ChatComplete, &body),
            request_fingerprint(FunctionName::ChatComplete, &body)
        );
    }

    #[test]
    fn any_field_difference_changes_the_fingerprint() {
        let a = json!({"model": "m", "temperature": 0.1});
        let b = json!({"model": "m", "temperature": 0.2});
        assert_ne!(
            request_fingerprint(FunctionName::ChatComplete, &a),
            request_fingerprint(FunctionName::ChatComplete, &b)
        );
        // same body, different function
        assert_ne!(
            request_fingerprint(FunctionName::ChatComplete, &a),
            request_fingerprint(FunctionName::Complete, &a)
        );
    }

    #[test]
    fn fingerprints_are_64_hex_chars(){
        let key = request_fingerprint(FunctionName::Embed, &json!({}));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
