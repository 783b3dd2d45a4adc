//! Container for a single BPM process

use std::collections::BTreeMap;

use boshpod_common::bpm::{HealthCheck, Process};
use boshpod_common::k8s::{
    Capabilities, Container, EnvVar, Lifecycle, ResourceRequirements, SecurityContext, VolumeMount,
};
use boshpod_common::quantity::Quantity;
use boshpod_common::{names, Error, Result, ROOT_USER_ID, VOLUME_JOBS_DIR_MOUNT_PATH};

/// Env var holding the pod's ordinal within its stateful set
pub const ENV_POD_ORDINAL: &str = "POD_ORDINAL";
/// Env var holding the replica count
pub const ENV_REPLICAS: &str = "REPLICAS";
/// Env var holding the AZ index
pub const ENV_AZ_INDEX: &str = "AZ_INDEX";
/// Pod label carrying the pod ordinal
pub const POD_ORDINAL_LABEL: &str = "quarks.cloudfoundry.org/pod-ordinal";

/// Everything needed to build one process container
#[derive(Clone, Debug)]
pub struct ProcessSpec<'a> {
    /// Job the process belongs to
    pub job: &'a str,
    /// The BPM process
    pub process: &'a Process,
    /// Release image of the job
    pub image: &'a str,
    /// Container command
    pub command: Vec<String>,
    /// Container args
    pub args: Vec<String>,
    /// Volume mounts, already deduplicated
    pub volume_mounts: Vec<VolumeMount>,
    /// Health checks of the job, keyed by process name
    pub health_checks: &'a BTreeMap<String, HealthCheck>,
    /// Extra environment of the job
    pub job_envs: &'a [EnvVar],
    /// Run-level security context of the job
    pub security_context: Option<&'a SecurityContext>,
}

/// Build the container running one BPM process.
///
/// The container gets an empty lifecycle; pre-stop hooks are attached by the
/// caller.
pub fn bpm_process_container(spec: ProcessSpec<'_>) -> Result<Container> {
    let process = spec.process;
    let limits = parse_limits(spec.job, process)?;

    let working_dir = process
        .workdir
        .clone()
        .filter(|w| !w.is_empty())
        .unwrap_or_else(|| format!("{}/{}", VOLUME_JOBS_DIR_MOUNT_PATH, spec.job));

    let health = spec.health_checks.get(&process.name);

    Ok(Container {
        name: names::container_name(spec.job, &process.name),
        image: spec.image.to_string(),
        command: spec.command,
        args: spec.args,
        working_dir: Some(working_dir),
        env: with_default_env(process.env_vars(spec.job_envs)),
        resources: ResourceRequirements {
            requests: process.requests.clone(),
            limits,
        },
        readiness_probe: health.and_then(|h| h.readiness_probe.clone()),
        liveness_probe: health.and_then(|h| h.liveness_probe.clone()),
        lifecycle: Some(Lifecycle::default()),
        volume_mounts: spec.volume_mounts,
        security_context: Some(security_context(spec.security_context, process)),
        ..Default::default()
    })
}

// Fill in unset fields only; the job's run-level settings always win.
fn security_context(base: Option<&SecurityContext>, process: &Process) -> SecurityContext {
    let mut ctx = base.cloned().unwrap_or_default();
    if ctx.capabilities.is_none() && !process.capabilities.is_empty() {
        ctx.capabilities = Some(Capabilities {
            add: process.capabilities.clone(),
            drop: Vec::new(),
        });
    }
    if ctx.privileged.is_none() {
        ctx.privileged = Some(process.unsafe_settings.privileged);
    }
    if ctx.run_as_user.is_none() {
        ctx.run_as_user = Some(ROOT_USER_ID);
    }
    ctx
}

fn parse_limits(job: &str, process: &Process) -> Result<BTreeMap<String, Quantity>> {
    let mut limits = BTreeMap::new();
    for (field, raw) in [("memory", &process.limits.memory), ("cpu", &process.limits.cpu)] {
        let Some(raw) = raw.as_deref().filter(|v| !v.is_empty()) else {
            continue;
        };
        let quantity = Quantity::parse(raw).map_err(|e| Error::QuantityParse {
            field: field.to_string(),
            value: raw.to_string(),
            job: job.to_string(),
            process: process.name.clone(),
            message: e.to_string(),
        })?;
        limits.insert(field.to_string(), quantity);
    }
    Ok(limits)
}

/// Append pod ordinal, replica count and AZ index unless already set
pub fn with_default_env(mut env: Vec<EnvVar>) -> Vec<EnvVar> {
    let defaults = [
        EnvVar::from_field(
            ENV_POD_ORDINAL,
            format!("metadata.labels['{}']", POD_ORDINAL_LABEL),
        ),
        EnvVar::literal(ENV_REPLICAS, "1"),
        EnvVar::literal(ENV_AZ_INDEX, "0"),
    ];
    for default in defaults {
        if !env.iter().any(|e| e.name == default.name) {
            env.push(default);
        }
    }
    env
}
