//! Structural equality over model snapshots
//!
//! Two values are equal when they are both scalars with the same value, or
//! both structured with identical key sets and pairwise-equal members.
//! Arrays are keyed by index, so an array and an object whose keys are
//! exactly `"0".."n-1"` compare equal, and arrays of different lengths
//! differ because their key sets differ.
//!
//! Numbers compare by numeric value: `1` and `1.0` are equal.
//!
//! Inputs must be acyclic. `serde_json::Value` cannot express a cycle, so
//! this holds for every model the crate can build.

use std::collections::BTreeSet;

use serde_json::{Number, Value};

use crate::util::Object;

/// Deep structural equality.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (is_structured(a), is_structured(b)) {
        (true, true) => {
            let a_keys = key_set(a);
            if a_keys != key_set(b) {
                return false;
            }
            a_keys
                .iter()
                .all(|key| match (member(a, key), member(b, key)) {
                    (Some(x), Some(y)) => deep_equal(x, y),
                    _ => false,
                })
        }
        (false, false) => scalar_equal(a, b),
        _ => false,
    }
}

/// [`deep_equal`] for two objects, without wrapping them in a `Value`.
pub fn objects_equal(a: &Object, b: &Object) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, x)| b.get(key).is_some_and(|y| deep_equal(x, y)))
}

fn is_structured(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

fn key_set(value: &Value) -> BTreeSet<String> {
    match value {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        _ => BTreeSet::new(),
    }
}

fn member<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

fn scalar_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_equal(x, y),
        _ => a == b,
    }
}

fn number_equal(x: &Number, y: &Number) -> bool {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x == y;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
