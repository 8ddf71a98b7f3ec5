//! Deterministic JSON canonicalization (spec.md §4.1).
//!
//! `canonical_json` produces a byte-stable UTF-8 encoding: object keys in
//! ascending codepoint order, no whitespace, array order preserved, numbers
//! in `serde_json`'s own shortest round-trippable form (we never touch the
//! scalar encoding, only key order), minimal JSON string escaping. `serde_json`
//! already guarantees the last two; the one property it doesn't give for free
//! is key order, which this module restores by walking a parsed `Value` tree.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Serialize any `Serialize` value to its canonical JSON string.
///
/// Panics only if `value` cannot be represented as JSON at all (e.g. a map
/// with non-string keys) — the same contract `serde_json::to_value` has.
pub fn canonical_json<T: Serialize>(value: &T) -> String {
    let v = serde_json::to_value(value).expect("value must be JSON-representable");
    let mut out = String::new();
    write_canonical(&v, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            // BTreeMap sorts by key's `Ord`, which for `String` is ascending
            // codepoint order — exactly what spec.md §4.1 requires.
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            out.push('{');
            for (i, (k, v)) in sorted.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(&Value::String((*k).clone()), out);
                out.push(':');
                write_canonical(v, out);
            }
            out.push('}');
        }
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
        // Numbers, strings, bools, and null already serialize with no
        // whitespace and minimal escaping via serde_json.
        _ => out.push_str(&serde_json::to_string(value).expect("scalar values always serialize")),
    }
}
