//! YAML parsing utilities using yaml-rust2
//!
//! Every YAML input (manifests, job specs, rendered BPM configs) is parsed into
//! a `serde_json::Value` tree first and then deserialized into typed structs.
//! The value tree is also the representation used for property overrides and
//! defaults, see [`crate::property`].

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use yaml_rust2::{Yaml, YamlLoader};

use crate::Error;

/// Parse a YAML string into a `serde_json::Value`.
///
/// Only the first document is returned. Empty input yields `Value::Null`.
pub fn parse_yaml(input: &str) -> Result<Value, Error> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| Error::Yaml(e.to_string()))?;
    match docs.into_iter().next() {
        Some(doc) => yaml_to_json(doc),
        None => Ok(Value::Null),
    }
}

/// Parse a YAML string straight into a typed value.
///
/// An empty document deserializes from an empty mapping so structs made of
/// defaulted fields still parse.
pub fn from_yaml_str<T: DeserializeOwned>(input: &str) -> Result<T, Error> {
    let value = match parse_yaml(input)? {
        Value::Null => Value::Object(Map::new()),
        v => v,
    };
    Ok(serde_json::from_value(value)?)
}

fn yaml_to_json(yaml: Yaml) -> Result<Value, Error> {
    match yaml {
        Yaml::Null => Ok(Value::Null),
        Yaml::Boolean(b) => Ok(Value::Bool(b)),
        Yaml::Integer(i) => Ok(Value::Number(i.into())),
        Yaml::Real(s) => {
            let f: f64 = s
                .parse()
                .map_err(|e: std::num::ParseFloatError| Error::Yaml(e.to_string()))?;
            Ok(Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null))
        }
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Array(arr) => arr
            .into_iter()
            .map(yaml_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Yaml::Hash(map) => map
            .into_iter()
            .map(|(k, v)| Ok((yaml_key(k)?, yaml_to_json(v)?)))
            .collect::<Result<Map<String, Value>, Error>>()
            .map(Value::Object),
        Yaml::Alias(_) => Err(Error::Yaml("YAML aliases not supported".to_string())),
        Yaml::BadValue => Err(Error::Yaml("bad YAML value".to_string())),
    }
}

// Manifests occasionally use bare numbers or booleans as keys.
fn yaml_key(key: Yaml) -> Result<String, Error> {
    match key {
        Yaml::String(s) => Ok(s),
        Yaml::Integer(i) => Ok(i.to_string()),
        Yaml::Real(r) => Ok(r),
        Yaml::Boolean(b) => Ok(b.to_string()),
        Yaml::Null => Ok("null".to_string()),
        _ => Err(Error::Yaml("unsupported YAML key type".to_string())),
    }
}
