//! Deterministic JSON rendering used to compare two logically-equal payloads.
//!
//! Objects have their keys sorted lexicographically at every depth, arrays
//! keep their order, and scalars use plain JSON encoding. Integral floats
//! inside the exactly-representable range render without a fractional part,
//! so `100.0` and `100` compare equal, as they do for the JavaScript peers
//! producing the other half of these signatures.

use serde_json::{Number, Value};

/// Largest integer magnitude an IEEE-754 double represents exactly (2^53).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

pub fn canonicalize(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

/// Structural equality under canonicalization.
pub fn canonical_eq(a: &Value, b: &Value) -> bool {
    canonicalize(a) == canonicalize(b)
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Number(n) => out.push_str(&canonical_number(n)),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        // Bool and String: Display on Value is the JSON encoding.
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn canonical_number(n: &Number) -> String {
    if n.is_f64() {
        if let Some(f) = n.as_f64() {
            if f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER {
                return format!("{}", f as i64);
            }
        }
    }
    n.to_string()
}
