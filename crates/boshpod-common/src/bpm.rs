//! BPM runtime configuration
//!
//! A job's `bpm.yml` declares the OS processes the job runs. Once rendered for
//! an instance it is parsed into [`Config`]; the container factory turns each
//! [`Process`] into one container.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::k8s::{EnvVar, Probe, SecurityContext};
use crate::yaml;
use crate::Result;

/// Parsed BPM runtime configuration of one job
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Processes in declaration order
    #[serde(default)]
    pub processes: Vec<Process>,
    /// Run-level settings shared by all processes
    #[serde(default)]
    pub run: Run,
}

impl Config {
    /// Parse a rendered bpm.yml document
    pub fn from_yaml(input: &str) -> Result<Self> {
        yaml::from_yaml_str(input)
    }

    /// Whether the job produces any containers
    pub fn has_processes(&self) -> bool {
        !self.processes.is_empty()
    }
}

/// A single BPM process
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Process {
    /// Process name, unique within the job
    pub name: String,
    /// Path of the executable
    pub executable: String,
    /// Arguments passed to the executable
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables
    #[serde(default, deserialize_with = "scalar_map")]
    pub env: BTreeMap<String, String>,
    /// Working directory
    #[serde(default)]
    pub workdir: Option<String>,
    /// Resource limits
    #[serde(default)]
    pub limits: Limits,
    /// Resource requests, passed through to the container unparsed
    #[serde(default, deserialize_with = "scalar_map")]
    pub requests: BTreeMap<String, String>,
    /// Linux capabilities to add
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Unsafe settings
    #[serde(default, rename = "unsafe")]
    pub unsafe_settings: Unsafe,
}

impl Process {
    /// Container environment: process env sorted by name, then `extra`
    pub fn env_vars(&self, extra: &[EnvVar]) -> Vec<EnvVar> {
        self.env
            .iter()
            .map(|(name, value)| EnvVar::literal(name, value))
            .chain(extra.iter().cloned())
            .collect()
    }
}

/// Resource limits as written in bpm.yml
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Limits {
    /// Memory limit (e.g., "512Mi")
    #[serde(default, deserialize_with = "scalar_string")]
    pub memory: Option<String>,
    /// CPU limit (e.g., "500m")
    #[serde(default, deserialize_with = "scalar_string")]
    pub cpu: Option<String>,
}

// Quantities are often written as bare YAML numbers (`cpu: 2`).
fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn scalar_string<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.and_then(scalar_to_string))
}

fn scalar_map<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<BTreeMap<String, String>, D::Error> {
    Ok(Option::<BTreeMap<String, Value>>::deserialize(d)?
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| scalar_to_string(v).map(|v| (k, v)))
        .collect())
}

/// Settings that weaken process isolation
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Unsafe {
    /// Run the process privileged
    #[serde(default)]
    pub privileged: bool,
}

/// Run-level settings
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Run {
    /// Health checks keyed by process name
    #[serde(default)]
    pub healthcheck: BTreeMap<String, HealthCheck>,
    /// Security context applied to every process container
    #[serde(default)]
    pub security_context: Option<SecurityContext>,
    /// Post-start settings
    #[serde(default)]
    pub post_start: PostStart,
}

/// Probes for one process
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct HealthCheck {
    /// Readiness probe
    #[serde(default, rename = "readinessProbe", alias = "readiness")]
    pub readiness_probe: Option<Probe>,
    /// Liveness probe
    #[serde(default, rename = "livenessProbe", alias = "liveness")]
    pub liveness_probe: Option<Probe>,
}

/// Post-start settings
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PostStart {
    /// Condition the post-start script waits for
    #[serde(default)]
    pub condition: Option<PostStartCondition>,
}

/// Post-start condition
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PostStartCondition {
    /// Exec-based condition
    #[serde(default)]
    pub exec: Option<crate::k8s::ExecAction>,
}

impl Run {
    /// Exec command of the post-start condition, if one with a command is set
    pub fn post_start_condition(&self) -> Option<&[String]> {
        self.post_start
            .condition
            .as_ref()
            .and_then(|c| c.exec.as_ref())
            .map(|e| e.command.as_slice())
            .filter(|cmd| !cmd.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BPM: &str = r#"
processes:
- name: nats
  executable: /var/vcap/packages/gnatsd/bin/gnatsd
  args: [-c, /var/vcap/jobs/nats/config/nats.conf]
  env:
    B: "2"
    A: "1"
  limits:
    memory: 512Mi
    cpu: 500m
  requests:
    memory: 128Mi
  capabilities: [NET_BIND_SERVICE]
  unsafe:
    privileged: true
- name: sidecar
  executable: /bin/sidecar
run:
  healthcheck:
    nats:
      readiness:
        exec:
          command: [/bin/true]
  security_context:
    runAsUser: 1000
  post_start:
    condition:
      exec:
        command: [/bin/check, --ready]
"#;

    #[test]
    fn parses_rendered_bpm_config() {
        let config = Config::from_yaml(BPM).unwrap();
        assert!(config.has_processes());
        assert_eq!(config.processes.len(), 2);

        let nats = &config.processes[0];
        assert_eq!(nats.args.len(), 2);
        assert_eq!(nats.limits.memory.as_deref(), Some("512Mi"));
        assert_eq!(nats.requests.get("memory").map(String::as_str), Some("128Mi"));
        assert!(nats.unsafe_settings.privileged);
        assert_eq!(nats.capabilities, vec!["NET_BIND_SERVICE"]);

        let sidecar = &config.processes[1];
        assert!(sidecar.args.is_empty());
        assert!(!sidecar.unsafe_settings.privileged);
        assert_eq!(sidecar.workdir, None);

        assert!(config.run.healthcheck["nats"].readiness_probe.is_some());
        assert!(config.run.healthcheck["nats"].liveness_probe.is_none());
        assert_eq!(
            config.run.security_context.as_ref().and_then(|s| s.run_as_user),
            Some(1000)
        );
        assert_eq!(
            config.run.post_start_condition(),
            Some(&["/bin/check".to_string(), "--ready".to_string()][..])
        );
    }

    #[test]
    fn env_vars_are_sorted_then_extended() {
        let config = Config::from_yaml(BPM).unwrap();
        let env = config.processes[0].env_vars(&[EnvVar::literal("Z", "26")]);
        let names: Vec<_> = env.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "Z"]);
    }

    #[test]
    fn numeric_quantities_are_read_as_strings() {
        let config = Config::from_yaml(
            "processes:\n- name: p\n  executable: /bin/p\n  limits:\n    cpu: 2\n  requests:\n    cpu: 0.5\n",
        )
        .unwrap();
        assert_eq!(config.processes[0].limits.cpu.as_deref(), Some("2"));
        assert_eq!(
            config.processes[0].requests.get("cpu").map(String::as_str),
            Some("0.5")
        );
    }

    #[test]
    fn empty_document_has_no_processes() {
        let config = Config::from_yaml("").unwrap();
        assert!(!config.has_processes());
        assert_eq!(config.run.post_start_condition(), None);
    }

    #[test]
    fn empty_condition_command_is_ignored() {
        let config =
            Config::from_yaml("run:\n  post_start:\n    condition:\n      exec:\n        command: []\n")
                .unwrap();
        assert_eq!(config.run.post_start_condition(), None);
    }
}
