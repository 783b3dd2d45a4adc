//! Instance group compiler
//!
//! Runs the whole pipeline for one instance group:
//!
//! 1. [`DataGatherer`] resolves links, instances and BPM configs of the
//!    group's jobs.
//! 2. [`ContainerFactory`] turns the BPM processes into containers, taking
//!    the errand path for `lifecycle: errand` groups.
//!
//! # Usage
//!
//! ```text
//! let compiler = InstanceGroupCompiler::new(manifest, "cf", base_dir, &images, config);
//! let compiled = compiler.compile("nats", &default_mounts, &disks)?;
//! // compiled.jobs, compiled.containers
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use boshpod_common::k8s::{Container, VolumeMount};
use boshpod_common::manifest::{Job, Manifest};
use boshpod_common::Result;
use boshpod_container::{ContainerFactory, ConverterConfig, DiskCatalog, ReleaseImageProvider};
use boshpod_manifest::DataGatherer;

/// Output of compiling one instance group
#[derive(Clone, Debug, Default, Serialize)]
pub struct CompiledInstanceGroup {
    /// The group's jobs with their resolved data
    pub jobs: Vec<Job>,
    /// Containers in job and process order, followed by the log sidecar
    pub containers: Vec<Container>,
}

/// Compiles instance groups of one deployment manifest
pub struct InstanceGroupCompiler<'a> {
    gatherer: DataGatherer,
    base_dir: PathBuf,
    images: &'a dyn ReleaseImageProvider,
    config: ConverterConfig,
}

impl<'a> InstanceGroupCompiler<'a> {
    /// Create a compiler for `manifest` deployed into `namespace`.
    ///
    /// Release job sources are read below `base_dir/jobs-src`.
    pub fn new(
        manifest: Manifest,
        namespace: impl Into<String>,
        base_dir: impl Into<PathBuf>,
        images: &'a dyn ReleaseImageProvider,
        config: ConverterConfig,
    ) -> Self {
        let gatherer =
            DataGatherer::new(manifest, namespace).with_cluster_domain(&config.cluster_domain);
        Self {
            gatherer,
            base_dir: base_dir.into(),
            images,
            config,
        }
    }

    /// Compile `instance_group` into containers.
    ///
    /// Jobs that ended up without a BPM config (no instances) are converted
    /// with an empty one and contribute no containers.
    pub fn compile(
        &self,
        instance_group: &str,
        default_mounts: &[VolumeMount],
        disks: &dyn DiskCatalog,
    ) -> Result<CompiledInstanceGroup> {
        let jobs = self.gatherer.gather_data(&self.base_dir, instance_group)?;
        let errand = self
            .gatherer
            .manifest()
            .instance_group(instance_group)
            .is_some_and(|ig| ig.is_errand());

        let bpm_configs: BTreeMap<_, _> = jobs
            .iter()
            .map(|job| (job.name.clone(), job.resolved.bpm.clone().unwrap_or_default()))
            .collect();

        let containers = ContainerFactory::new(
            instance_group,
            bpm_configs,
            self.images,
            self.config.clone(),
        )
        .with_errand(errand)
        .convert(&jobs, default_mounts, disks)?;

        info!(
            instance_group = %instance_group,
            errand,
            jobs = jobs.len(),
            containers = containers.len(),
            "compiled instance group"
        );
        Ok(CompiledInstanceGroup { jobs, containers })
    }
}
