//! BOSH deployment manifest types
//!
//! The raw manifest is read-only input. Everything computed while compiling a
//! job (instances, consumed links, BPM config, release) lives in
//! [`ResolvedJob`], which is filled in once per compilation pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::bpm;
use crate::k8s::EnvVar;
use crate::property;
use crate::yaml;
use crate::Result;

/// Instance group lifecycle marking one-shot errands
pub const LIFECYCLE_ERRAND: &str = "errand";

/// A BOSH deployment manifest
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Deployment name
    #[serde(default)]
    pub name: String,
    /// Releases used by the deployment
    #[serde(default)]
    pub releases: Vec<Release>,
    /// Instance groups in declaration order
    #[serde(default)]
    pub instance_groups: Vec<InstanceGroup>,
}

impl Manifest {
    /// Parse a manifest from YAML
    pub fn from_yaml(input: &str) -> Result<Self> {
        yaml::from_yaml_str(input)
    }

    /// Whether `release` is declared in the manifest's releases block
    pub fn has_release(&self, release: &str) -> bool {
        self.releases.iter().any(|r| r.name == release)
    }

    /// Look up an instance group by name
    pub fn instance_group(&self, name: &str) -> Option<&InstanceGroup> {
        self.instance_groups.iter().find(|ig| ig.name == name)
    }
}

/// A release reference
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Release {
    /// Release name
    pub name: String,
    /// Release version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A horizontally replicated group of jobs
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct InstanceGroup {
    /// Group name
    pub name: String,
    /// Replica count
    #[serde(default)]
    pub instances: usize,
    /// Availability zones in declaration order
    #[serde(default)]
    pub azs: Vec<String>,
    /// `errand` for one-shot groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<String>,
    /// Jobs in declaration order
    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl InstanceGroup {
    /// Whether the group runs errands instead of long-lived jobs
    pub fn is_errand(&self) -> bool {
        self.lifecycle.as_deref() == Some(LIFECYCLE_ERRAND)
    }
}

/// A job placed into an instance group
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Job {
    /// Job name
    pub name: String,
    /// Release the job comes from
    pub release: String,
    /// Property overrides
    #[serde(default)]
    pub properties: JobProperties,
    /// Provider overrides, keyed by provider name (`as` renames)
    #[serde(default)]
    pub provides: BTreeMap<String, Value>,
    /// Consumer overrides, keyed by consumer name (`from` or nil)
    #[serde(default)]
    pub consumes: BTreeMap<String, Value>,
    /// Data computed during compilation
    #[serde(default, skip_serializing_if = "ResolvedJob::is_empty")]
    pub resolved: ResolvedJob,
}

impl Job {
    /// Look up a manifest-level property override by dotted path
    pub fn property(&self, path: &str) -> Option<&Value> {
        property::lookup_in(&self.properties.properties, path)
    }
}

/// Property overrides of a job
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct JobProperties {
    /// Operator-specific settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarks: Option<QuarksProperties>,
    /// Release property overrides
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl JobProperties {
    /// Extra environment for every container of the job
    pub fn envs(&self) -> &[EnvVar] {
        self.quarks.as_ref().map(|q| q.envs.as_slice()).unwrap_or(&[])
    }
}

/// Operator-specific job settings
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct QuarksProperties {
    /// Environment added to every container of the job
    #[serde(default)]
    pub envs: Vec<EnvVar>,
}

/// Data derived for a job while compiling a deployment
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ResolvedJob {
    /// Release name, set when the release is declared in the manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release: Option<String>,
    /// Instances of the job across the group's replicas and AZs
    #[serde(default)]
    pub instances: Vec<JobInstance>,
    /// Consumed links keyed by the consumer name declared in the job spec
    #[serde(default)]
    pub consumes: BTreeMap<String, JobLink>,
    /// BPM config of the first instance; unset when there are no instances
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<bpm::Config>,
}

impl ResolvedJob {
    /// Whether nothing has been resolved yet
    pub fn is_empty(&self) -> bool {
        self.release.is_none()
            && self.instances.is_empty()
            && self.consumes.is_empty()
            && self.bpm.is_none()
    }
}

/// Identity of one job instance
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct JobInstance {
    /// DNS address of the instance
    pub address: String,
    /// Availability zone (empty when the group declares none)
    pub az: String,
    /// Instance identifier (`{group}-{index}-{job}`)
    pub id: String,
    /// Dense index across replicas and AZs
    pub index: usize,
    /// Replica ordinal
    pub instance: usize,
    /// Display name (`{group}-{job}`)
    pub name: String,
}

/// A resolved provider: its instances and effective properties
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct JobLink {
    /// Instances of the providing job
    pub instances: Vec<JobInstance>,
    /// Properties exposed through the link
    pub properties: Map<String, Value>,
}
