//! Template context for job template rendering

use std::collections::BTreeMap;

use minijinja::Value;
use serde::Serialize;
use serde_json::Map;

use boshpod_common::manifest::{JobInstance, JobLink};

/// Values available to a job template for one instance
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateContext {
    /// `{{ properties.* }}` - merged job properties
    pub properties: Map<String, serde_json::Value>,

    /// `{{ spec.* }}` - identity of the instance being rendered
    pub spec: InstanceContext,

    /// `{{ links.NAME.instances }}`, `{{ links.NAME.properties.* }}`
    pub links: BTreeMap<String, JobLink>,
}

impl TemplateContext {
    /// Create a new builder for TemplateContext
    pub fn builder() -> TemplateContextBuilder {
        TemplateContextBuilder::default()
    }

    /// Convert to minijinja Value for rendering
    pub fn to_value(&self) -> Value {
        Value::from_serialize(self)
    }
}

/// Instance identity exposed as `spec`
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct InstanceContext {
    /// DNS address of the instance
    pub address: String,
    /// Availability zone
    pub az: String,
    /// Instance id
    pub id: String,
    /// Dense instance index
    pub index: usize,
    /// Instance name
    pub name: String,
    /// Deployment name
    pub deployment: String,
    /// Whether this is the first instance
    pub bootstrap: bool,
}

impl InstanceContext {
    /// Identity of `instance` within `deployment`
    pub fn new(instance: &JobInstance, deployment: &str) -> Self {
        Self {
            address: instance.address.clone(),
            az: instance.az.clone(),
            id: instance.id.clone(),
            index: instance.index,
            name: instance.name.clone(),
            deployment: deployment.to_string(),
            bootstrap: instance.index == 0,
        }
    }
}

/// Builder for TemplateContext
#[derive(Debug, Default)]
pub struct TemplateContextBuilder {
    properties: Map<String, serde_json::Value>,
    spec: Option<InstanceContext>,
    links: BTreeMap<String, JobLink>,
}

impl TemplateContextBuilder {
    /// Set the merged property tree
    pub fn properties(mut self, properties: Map<String, serde_json::Value>) -> Self {
        self.properties = properties;
        self
    }

    /// Set the instance being rendered
    pub fn instance(mut self, instance: &JobInstance, deployment: &str) -> Self {
        self.spec = Some(InstanceContext::new(instance, deployment));
        self
    }

    /// Set all consumed links
    pub fn links(mut self, links: BTreeMap<String, JobLink>) -> Self {
        self.links = links;
        self
    }

    /// Build the TemplateContext
    pub fn build(self) -> TemplateContext {
        TemplateContext {
            properties: self.properties,
            spec: self.spec.unwrap_or_default(),
            links: self.links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn instance(index: usize) -> JobInstance {
        JobInstance {
            address: format!("nats-{index}-nats.cf.svc.cluster.local"),
            az: "z1".to_string(),
            id: format!("nats-{index}-nats"),
            index,
            instance: index,
            name: "nats-nats".to_string(),
        }
    }

    #[test]
    fn bootstrap_is_set_for_first_instance_only() {
        assert!(InstanceContext::new(&instance(0), "cf").bootstrap);
        assert!(!InstanceContext::new(&instance(1), "cf").bootstrap);
    }

    #[test]
    fn value_exposes_all_sections() {
        let mut props = Map::new();
        props.insert("nats".to_string(), json!({"port": 4222}));
        let ctx = TemplateContext::builder()
            .properties(props)
            .instance(&instance(1), "cf")
            .links(BTreeMap::from([(
                "nats".to_string(),
                JobLink {
                    instances: vec![instance(0)],
                    properties: Map::new(),
                },
            )]))
            .build();

        let value = ctx.to_value();
        let spec = value.get_attr("spec").unwrap();
        assert_eq!(spec.get_attr("deployment").unwrap().to_string(), "cf");
        assert_eq!(spec.get_attr("index").unwrap().to_string(), "1");
        let port = value
            .get_attr("properties")
            .and_then(|p| p.get_attr("nats"))
            .and_then(|n| n.get_attr("port"))
            .unwrap();
        assert_eq!(port.to_string(), "4222");
        let links = value.get_attr("links").unwrap();
        assert!(!links.get_attr("nats").unwrap().is_undefined());
    }

    #[test]
    fn missing_instance_defaults_to_empty_identity() {
        let ctx = TemplateContext::builder().build();
        assert_eq!(ctx.spec, InstanceContext::default());
    }
}
