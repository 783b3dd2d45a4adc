//! Filters and functions available to job templates
//!
//! - `default`: fallback for undefined or null values
//! - `required`: fail if the value is undefined
//! - `base64_encode`: encode a string as base64
//! - `p(path, default?)`: property lookup by dotted path

use base64::{engine::general_purpose::STANDARD, Engine};
use minijinja::{Error, ErrorKind, State, Value};

/// Default filter - returns fallback if value is undefined or null
///
/// Usage: `{{ properties.nats.port | default(4222) }}`
pub fn default_filter(value: Value, fallback: Value) -> Value {
    if value.is_undefined() || value.is_none() {
        fallback
    } else {
        value
    }
}

/// Base64 encode filter
///
/// Usage: `{{ properties.nats.password | base64_encode }}`
pub fn base64_encode(value: &str) -> String {
    STANDARD.encode(value.as_bytes())
}

/// Required filter - fails if value is undefined
///
/// Usage: `{{ properties.nats.user | required }}`
pub fn required(value: Value) -> Result<Value, Error> {
    if value.is_undefined() {
        Err(Error::new(
            ErrorKind::UndefinedError,
            "required value is undefined",
        ))
    } else {
        Ok(value)
    }
}

/// Property lookup function
///
/// Walks `properties` along the dotted `path`. A missing or null property
/// yields `default` when given and is an error otherwise.
///
/// Usage: `{{ p("nats.port", 4222) }}`
pub fn p(state: &State, path: &str, default: Option<Value>) -> Result<Value, Error> {
    let found = state.lookup("properties").and_then(|root| {
        path.split('.').try_fold(root, |node, segment| {
            node.get_attr(segment).ok().filter(|v| !v.is_undefined())
        })
    });

    match found {
        Some(value) if !value.is_none() => Ok(value),
        _ => default.ok_or_else(|| {
            Error::new(
                ErrorKind::UndefinedError,
                format!("can't find property '{}'", path),
            )
        }),
    }
}
