//! Release job specifications (`job.MF`)

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::property;

/// A job's release-provided specification
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct JobSpec {
    /// Job name as declared by the release
    #[serde(default)]
    pub name: String,
    /// Links this job provides
    #[serde(default)]
    pub provides: Vec<ProvidedLink>,
    /// Links this job consumes
    #[serde(default)]
    pub consumes: Vec<ConsumedLink>,
    /// Property declarations, keyed by (possibly dotted) name
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDefinition>,
    /// Templates: source file (under `templates/`) → rendered destination
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
}

/// A link provided by a job
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ProvidedLink {
    /// Link name
    pub name: String,
    /// Link type
    #[serde(rename = "type")]
    pub link_type: String,
    /// Property names exposed through the link
    #[serde(default)]
    pub properties: Vec<String>,
}

/// A link consumed by a job
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ConsumedLink {
    /// Link name
    pub name: String,
    /// Link type
    #[serde(rename = "type")]
    pub link_type: String,
    /// Whether the job works without this link
    #[serde(default)]
    pub optional: bool,
}

/// Declaration of a single job property
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PropertyDefinition {
    /// Default value, if any
    #[serde(default)]
    pub default: Option<Value>,
    /// Human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl JobSpec {
    /// Default value of a declared property, `Null` when none is declared
    pub fn property_default(&self, name: &str) -> Value {
        self.properties
            .get(name)
            .and_then(|p| p.default.clone())
            .unwrap_or(Value::Null)
    }

    /// All declared properties with their defaults, expanded into a tree
    pub fn default_properties(&self) -> Map<String, Value> {
        let mut tree = Map::new();
        for name in self.properties.keys() {
            property::set_path(&mut tree, name, self.property_default(name));
        }
        tree
    }

    /// Source of the template whose destination file is named `file_name`
    pub fn template_for(&self, file_name: &str) -> Option<&str> {
        self.templates
            .iter()
            .find(|(_, dst)| {
                Path::new(dst.as_str())
                    .file_name()
                    .is_some_and(|f| f == file_name)
            })
            .map(|(src, _)| src.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::from_yaml_str;
    use serde_json::json;

    const NATS_SPEC: &str = r#"
name: nats
templates:
  nats.conf.erb: config/nats.conf
  bpm.yml.erb: config/bpm.yml
provides:
- name: nats
  type: nats
  properties:
  - nats.user
  - nats.port
consumes:
- name: nats
  type: nats
  optional: true
properties:
  nats.user:
    description: user name
  nats.port:
    default: 4222
"#;

    #[test]
    fn parses_job_manifest() {
        let spec: JobSpec = from_yaml_str(NATS_SPEC).unwrap();
        assert_eq!(spec.name, "nats");
        assert_eq!(spec.provides[0].link_type, "nats");
        assert_eq!(spec.provides[0].properties, vec!["nats.user", "nats.port"]);
        assert!(spec.consumes[0].optional);
        assert_eq!(spec.property_default("nats.port"), json!(4222));
        assert_eq!(spec.property_default("nats.user"), Value::Null);
        assert_eq!(spec.property_default("undeclared"), Value::Null);
    }

    #[test]
    fn default_properties_merge_shared_prefixes() {
        let spec: JobSpec = from_yaml_str(NATS_SPEC).unwrap();
        assert_eq!(
            Value::Object(spec.default_properties()),
            json!({"nats": {"port": 4222, "user": null}})
        );
    }

    #[test]
    fn finds_bpm_template_by_destination_base_name() {
        let spec: JobSpec = from_yaml_str(NATS_SPEC).unwrap();
        assert_eq!(spec.template_for("bpm.yml"), Some("bpm.yml.erb"));
        assert_eq!(spec.template_for("missing.yml"), None);
    }
}
