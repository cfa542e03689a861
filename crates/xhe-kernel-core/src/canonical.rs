//! Canonical JSON encoding for deterministic hashing.
//!
//! Pulse hashes are computed over a canonical text form:
//! - Object keys sorted by byte comparison
//! - No insignificant whitespace
//! - Strings escaped exactly as `serde_json` escapes them
//! - Numbers rendered by `serde_json::Number`'s display
//!
//! The same record produces identical bytes (and thus identical hashes) on
//! every platform.

use serde::Serialize;
use serde_json::Value;

use crate::crypto::ContentHash;
use crate::error::CoreError;

/// Encode any serializable value to canonical JSON text.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CoreError> {
    let value = serde_json::to_value(value).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(canonical_value(&value))
}

/// Encode an already-built JSON value to canonical text.
pub fn canonical_value(value: &Value) -> String {
    let mut buf = String::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Hash the canonical form of a value.
pub fn canonical_hash<T: Serialize + ?Sized>(value: &T) -> Result<ContentHash, CoreError> {
    let text = canonical_json(value)?;
    Ok(ContentHash::of_str(&text))
}

/// Recursively encode a JSON value.
fn encode_value_to(buf: &mut String, value: &Value) {
    match value {
        Value::Null => buf.push_str("null"),
        Value::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => buf.push_str(&n.to_string()),
        Value::String(s) => encode_string(buf, s),
        Value::Array(items) => {
            buf.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                encode_value_to(buf, item);
            }
            buf.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.as_bytes().cmp(b.as_bytes()));

            buf.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                encode_string(buf, key);
                buf.push(':');
                encode_value_to(buf, item);
            }
            buf.push('}');
        }
    }
}

fn encode_string(buf: &mut String, s: &str) {
    // Serializing a &str cannot fail.
    match serde_json::to_string(s) {
        Ok(escaped) => buf.push_str(&escaped),
        Err(_) => buf.push_str("\"\""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted_no_whitespace() {
        let value = json!({"b": 1, "a": [true, null, "x"], "c": {"z": 0, "y": -2}});
        assert_eq!(
            canonical_value(&value),
            r#"{"a":[true,null,"x"],"b":1,"c":{"y":-2,"z":0}}"#
        );
    }

    #[test]
    fn test_insertion_order_irrelevant() {
        let mut m1 = serde_json::Map::new();
        m1.insert("type".into(), json!("FOLLOW"));
        m1.insert("author".into(), json!("did:xhe:00"));
        let mut m2 = serde_json::Map::new();
        m2.insert("author".into(), json!("did:xhe:00"));
        m2.insert("type".into(), json!("FOLLOW"));
        assert_eq!(
            canonical_value(&Value::Object(m1)),
            canonical_value(&Value::Object(m2))
        );
    }

    #[test]
    fn test_string_escaping() {
        let value = json!({"k": "line\n\"quoted\""});
        assert_eq!(canonical_value(&value), r#"{"k":"line\n\"quoted\""}"#);
    }

    #[test]
    fn test_canonical_hash_matches_text_hash() {
        let value = json!({"a": 1});
        let hash = canonical_hash(&value).unwrap();
        assert_eq!(hash, ContentHash::of_str(r#"{"a":1}"#));
    }
}
