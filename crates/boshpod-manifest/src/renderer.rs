//! BPM config rendering
//!
//! Renders a job's `bpm.yml` template once per instance and keeps the first
//! instance's parsed config as the job's BPM config.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use boshpod_common::bpm;
use boshpod_common::job_spec::JobSpec;
use boshpod_common::manifest::Job;
use boshpod_common::{property, Error, Result, BPM_CONFIG_FILE};

use crate::spec_cache::JobSpecCache;
use crate::template::{TemplateContext, TemplateEngine};

/// Render the BPM config of `job` and store it on the job's resolved data.
///
/// Requires the job's spec in `specs` and its instances and consumed links to
/// be resolved. A job without instances is left without a BPM config.
pub fn render_runtime_config(job: &mut Job, specs: &JobSpecCache, deployment_name: &str) -> Result<()> {
    let spec = specs.get(&job.release, &job.name).ok_or_else(|| {
        Error::spec_load(&job.release, &job.name, "job spec was not collected")
    })?;
    let template = spec
        .template_for(BPM_CONFIG_FILE)
        .ok_or_else(|| Error::TemplateNotFound {
            job: job.name.clone(),
        })?;

    if job.resolved.instances.is_empty() {
        debug!(job = %job.name, "job has no instances, skipping BPM rendering");
        return Ok(());
    }

    let path = specs.template_path(&job.release, &job.name, template);
    let engine = TemplateEngine::new();
    let properties = merged_properties(spec, job);

    let mut configs = Vec::with_capacity(job.resolved.instances.len());
    for instance in &job.resolved.instances {
        let ctx = TemplateContext::builder()
            .properties(properties.clone())
            .instance(instance, deployment_name)
            .links(job.resolved.consumes.clone())
            .build();
        let rendered = engine
            .render_file(&path, &ctx)
            .map_err(|e| Error::template_render(&job.name, e.to_string()))?;
        let config = bpm::Config::from_yaml(&rendered)
            .map_err(|e| Error::template_render(&job.name, e.to_string()))?;
        configs.push(config);
    }

    let mut configs = configs.into_iter();
    let first = configs.next();
    if let Some(first) = &first {
        if configs.any(|other| &other != first) {
            warn!(
                job = %job.name,
                deployment = %deployment_name,
                "found different runtime configs across instances — unsupported"
            );
        }
    }
    job.resolved.bpm = first;
    Ok(())
}

// Spec defaults overridden by the job's manifest properties.
fn merged_properties(spec: &JobSpec, job: &Job) -> Map<String, Value> {
    let mut properties = spec.default_properties();
    property::deep_merge(&mut properties, job.properties.properties.clone());
    properties
}
