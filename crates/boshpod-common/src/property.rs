//! Property tree operations
//!
//! Manifest overrides, job spec defaults and rendered properties all share the
//! `serde_json::Value` tree. Property names may be dotted paths (`nats.port`)
//! which address nested mappings.

use serde_json::{Map, Value};

/// Walk `tree` along a dotted `path`.
///
/// Returns `None` when a segment is missing or an intermediate value is not a
/// mapping. A failed lookup only affects the caller asking for that path.
pub fn lookup<'a>(tree: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(tree, |node, segment| node.as_object()?.get(segment))
}

/// Like [`lookup`], starting from a mapping instead of a value.
pub fn lookup_in<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let (first, rest) = match path.split_once('.') {
        Some((first, rest)) => (first, Some(rest)),
        None => (path, None),
    };
    let node = map.get(first)?;
    match rest {
        Some(rest) => lookup(node, rest),
        None => Some(node),
    }
}

/// Set `value` at a dotted `path`, creating intermediate mappings.
///
/// Intermediate values that are not mappings are replaced.
pub fn set_path(map: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((first, rest)) => {
            let child = map
                .entry(first.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                set_path(child, rest, value);
            }
        }
    }
}

/// Recursively merge `overlay` into `base`.
///
/// Mappings are merged key by key; any other overlay value replaces the base
/// value, including sequences and explicit nulls.
pub fn deep_merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match value {
            Value::Object(incoming) => match base.get_mut(&key) {
                Some(Value::Object(existing)) => deep_merge(existing, incoming),
                _ => {
                    base.insert(key, Value::Object(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}
