//! JSON canónico: claves ordenadas y sin espacios.
//!
//! Es la forma serializada que define la igualdad estructural de un
//! `ParameterSet` y la base de su digest.

use serde_json::Value;
use std::collections::BTreeMap;

pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(map) => {
            let mut tree = BTreeMap::new();
            for (k, v) in map {
                tree.insert(k, to_canonical_json(v));
            }
            let items: Vec<String> = tree.into_iter()
                                         .map(|(k, v)| format!("{}:{}", quote(k), v))
                                         .collect();
            format!("{{{}}}", items.join(","))
        }
    }
}

// Serializar un &str a JSON no puede fallar; el fallback nunca se alcanza.
fn quote(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s.escape_default()))
}

#[cfg(test)]
mod tests {
    use super::to_canonical_json;
    use serde_json::json;

    #[test]
    fn test_primitives() {
        assert_eq!(to_canonical_json(&json!(null)), "null");
        assert_eq!(to_canonical_json(&json!(false)), "false");
        assert_eq!(to_canonical_json(&json!(2.5)), "2.5");
        assert_eq!(to_canonical_json(&json!("World")), "\"World\"");
    }

    #[test]
    fn test_object_sorted_keys() {
        let val = json!({ "n": 10, "Hello": "World" });
        assert_eq!(to_canonical_json(&val), "{\"Hello\":\"World\",\"n\":10}");
    }

    #[test]
    fn test_nested() {
        let val = json!({ "grid": { "ny": 32, "nx": 16 }, "steps": [1, { "b": null, "a": true }] });
        assert_eq!(to_canonical_json(&val),
                   "{\"grid\":{\"nx\":16,\"ny\":32},\"steps\":[1,{\"a\":true,\"b\":null}]}");
    }

    #[test]
    fn test_escaped_strings() {
        assert_eq!(to_canonical_json(&json!({"q": "a\"b\n"})), "{\"q\":\"a\\\"b\\n\"}");
    }
}
