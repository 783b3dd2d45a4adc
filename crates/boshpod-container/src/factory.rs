//! Container factory for one instance group

use std::collections::BTreeMap;

use tracing::{debug, info};

use boshpod_common::bpm;
use boshpod_common::k8s::{Container, VolumeMount};
use boshpod_common::manifest::Job;
use boshpod_common::{Error, Result};

use crate::command::{bpm_command, errand_command, PostStart};
use crate::config::ConverterConfig;
use crate::disks::{container_mounts, DiskCatalog};
use crate::drain::{drain_script, drain_wait};
use crate::image::ReleaseImageProvider;
use crate::process::{bpm_process_container, ProcessSpec};
use crate::sidecar::logs_tailer_container;

/// Builds the containers of one instance group from its jobs' BPM configs
pub struct ContainerFactory<'a> {
    instance_group: String,
    errand: bool,
    bpm_configs: BTreeMap<String, bpm::Config>,
    images: &'a dyn ReleaseImageProvider,
    config: ConverterConfig,
}

impl<'a> ContainerFactory<'a> {
    /// Create a factory for a regular (non-errand) instance group
    pub fn new(
        instance_group: impl Into<String>,
        bpm_configs: BTreeMap<String, bpm::Config>,
        images: &'a dyn ReleaseImageProvider,
        config: ConverterConfig,
    ) -> Self {
        Self {
            instance_group: instance_group.into(),
            errand: false,
            bpm_configs,
            images,
            config,
        }
    }

    /// Build errand containers instead of supervised job containers
    pub fn with_errand(mut self, errand: bool) -> Self {
        self.errand = errand;
        self
    }

    /// Convert `jobs` into containers.
    ///
    /// One container per BPM process, in job and process order, followed by
    /// the log sidecar unless it is disabled. Jobs without processes produce
    /// nothing. Every job needs a BPM config.
    pub fn convert(
        &self,
        jobs: &[Job],
        default_mounts: &[VolumeMount],
        disks: &dyn DiskCatalog,
    ) -> Result<Vec<Container>> {
        let stamp_count = self.rendezvous_target(jobs)?;
        let mut containers = Vec::new();

        for job in jobs {
            let config = self.bpm_config(&job.name)?;
            if !config.has_processes() {
                debug!(job = %job.name, "job has no BPM processes");
                continue;
            }

            let image = self.release_image(&job.name)?;
            let bpm_mounts = disks.bpm_mounts(&job.name);

            for (k, process) in config.processes.iter().enumerate() {
                let volume_mounts = container_mounts(
                    default_mounts,
                    disks.process_mounts(&job.name, &process.name),
                    &bpm_mounts,
                );

                let (command, args) = if self.errand {
                    errand_command(process)
                } else if k == 0 {
                    let post_start = PostStart::for_job(&job.name, config.run.post_start_condition());
                    bpm_command(&job.name, process, &post_start)
                } else {
                    bpm_command(&job.name, process, &PostStart::default())
                };

                let mut container = bpm_process_container(ProcessSpec {
                    job: &job.name,
                    process,
                    image: &image,
                    command,
                    args,
                    volume_mounts,
                    health_checks: &config.run.healthcheck,
                    job_envs: job.properties.envs(),
                    security_context: config.run.security_context.as_ref(),
                })?;

                if !self.errand {
                    let hook = if k == 0 {
                        drain_script(&job.name, stamp_count)
                    } else {
                        drain_wait(stamp_count)
                    };
                    if let Some(lifecycle) = container.lifecycle.as_mut() {
                        lifecycle.pre_stop = Some(hook);
                    }
                }
                containers.push(container);
            }
        }

        if !self.config.disable_log_sidecar {
            containers.push(logs_tailer_container(&self.config));
        }

        info!(
            instance_group = %self.instance_group,
            errand = self.errand,
            containers = containers.len(),
            drain_stamps = stamp_count,
            "converted jobs to containers"
        );
        Ok(containers)
    }

    /// Number of drain stamps every container waits for: the number of jobs
    /// with at least one BPM process.
    pub fn rendezvous_target(&self, jobs: &[Job]) -> Result<usize> {
        jobs.iter().try_fold(0, |count, job| {
            let config = self.bpm_config(&job.name)?;
            Ok(count + usize::from(config.has_processes()))
        })
    }

    fn bpm_config(&self, job: &str) -> Result<&bpm::Config> {
        self.bpm_configs
            .get(job)
            .ok_or_else(|| Error::missing_runtime_config(job))
    }

    fn release_image(&self, job: &str) -> Result<String> {
        self.images
            .release_image(&self.instance_group, job)
            .map_err(|e| match e {
                e @ Error::ImageLookup { .. } => e,
                other => Error::image_lookup(&self.instance_group, job, other.to_string()),
            })
    }
}
