//! Data gathering for one instance group
//!
//! Links are collected across the whole deployment, since any group may
//! provide links consumed by another. Consumers and BPM configs are then
//! resolved only for the jobs of the requested group.

use std::path::Path;

use tracing::{debug, info};

use boshpod_common::manifest::{Job, Manifest};
use boshpod_common::{Error, Result, DEFAULT_CLUSTER_DOMAIN};

use crate::links::LinkResolver;
use crate::renderer::render_runtime_config;

/// Resolves the jobs of an instance group against a deployment manifest
#[derive(Clone, Debug)]
pub struct DataGatherer {
    manifest: Manifest,
    namespace: String,
    cluster_domain: String,
}

impl DataGatherer {
    /// Create a gatherer for `manifest` deployed into `namespace`
    pub fn new(manifest: Manifest, namespace: impl Into<String>) -> Self {
        Self {
            manifest,
            namespace: namespace.into(),
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
        }
    }

    /// Use a cluster domain other than `cluster.local` for instance addresses
    pub fn with_cluster_domain(mut self, cluster_domain: impl Into<String>) -> Self {
        self.cluster_domain = cluster_domain.into();
        self
    }

    /// The manifest being gathered from
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Resolve instances, consumed links, release and BPM config of every job
    /// in `instance_group`.
    ///
    /// Job sources are read from `<base_dir>/jobs-src`. The gatherer's manifest
    /// is not modified; the resolved jobs are returned in declaration order.
    pub fn gather_data(&self, base_dir: &Path, instance_group: &str) -> Result<Vec<Job>> {
        let mut manifest = self.manifest.clone();
        let mut resolver =
            LinkResolver::new(base_dir, &self.namespace).with_cluster_domain(&self.cluster_domain);
        resolver.collect_specs_and_links(&mut manifest)?;

        let index = manifest
            .instance_groups
            .iter()
            .position(|ig| ig.name == instance_group)
            .ok_or_else(|| Error::InstanceGroupNotFound(instance_group.to_string()))?;
        let mut jobs = manifest.instance_groups.swap_remove(index).jobs;
        let deployment = &manifest.name;

        for job in &mut jobs {
            if manifest.has_release(&job.release) {
                job.resolved.release = Some(job.release.clone());
            }
            resolver.resolve_consumers(job)?;
            render_runtime_config(job, resolver.specs(), deployment)?;
            debug!(
                job = %job.name,
                consumes = job.resolved.consumes.len(),
                instances = job.resolved.instances.len(),
                "resolved job"
            );
        }

        info!(
            deployment = %deployment,
            instance_group = %instance_group,
            jobs = jobs.len(),
            providers = resolver.providers().len(),
            "gathered instance group data"
        );
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::write_job;

    const NATS_MF: &str = r#"
name: nats
templates:
  bpm.yml.erb: config/bpm.yml
provides:
- name: nats
  type: nats
  properties: [nats.port]
properties:
  nats.port:
    default: 4222
"#;

    const ROUTER_MF: &str = r#"
name: router
templates:
  bpm.yml.erb: config/bpm.yml
consumes:
- name: nats
  type: nats
"#;

    const ROUTER_BPM: &str = r#"
processes:
- name: router
  executable: /var/vcap/packages/gorouter/bin/gorouter
  args:
{% for i in links.nats.instances %}  - "{{ i.address }}:{{ links.nats.properties.nats.port }}"
{% endfor %}"#;

    const MANIFEST: &str = r#"
name: cf
releases:
- name: routing
instance_groups:
- name: nats
  instances: 2
  azs: [z1]
  jobs:
  - name: nats
    release: nats
    properties:
      nats:
        port: 4223
- name: router
  instances: 1
  jobs:
  - name: router
    release: routing
"#;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write_job(
            dir.path(),
            "nats",
            "nats",
            NATS_MF,
            &[("bpm.yml.erb", "processes:\n- {name: nats, executable: /bin/nats}\n")],
        );
        write_job(dir.path(), "routing", "router", ROUTER_MF, &[("bpm.yml.erb", ROUTER_BPM)]);
        dir
    }

    #[test]
    fn gathers_links_across_groups() {
        let dir = fixture();
        let gatherer = DataGatherer::new(Manifest::from_yaml(MANIFEST).unwrap(), "cf");

        let jobs = gatherer.gather_data(dir.path(), "router").unwrap();
        assert_eq!(jobs.len(), 1);
        let router = &jobs[0];
        assert_eq!(router.resolved.release.as_deref(), Some("routing"));
        assert_eq!(router.resolved.instances.len(), 1);

        let bpm = router.resolved.bpm.as_ref().unwrap();
        assert_eq!(
            bpm.processes[0].args,
            vec![
                "nats-0-nats.cf.svc.cluster.local:4223",
                "nats-1-nats.cf.svc.cluster.local:4223"
            ]
        );
    }

    #[test]
    fn release_is_only_recorded_when_declared() {
        let dir = fixture();
        let gatherer = DataGatherer::new(Manifest::from_yaml(MANIFEST).unwrap(), "cf");

        let jobs = gatherer.gather_data(dir.path(), "nats").unwrap();
        assert_eq!(jobs[0].resolved.release, None);
        assert!(jobs[0].resolved.bpm.is_some());
    }

    #[test]
    fn cluster_domain_reaches_link_addresses() {
        let dir = fixture();
        let gatherer = DataGatherer::new(Manifest::from_yaml(MANIFEST).unwrap(), "cf")
            .with_cluster_domain("example.internal");

        let jobs = gatherer.gather_data(dir.path(), "router").unwrap();
        let link = &jobs[0].resolved.consumes["nats"];
        assert_eq!(link.instances[0].address, "nats-0-nats.cf.svc.example.internal");
    }

    #[test]
    fn unknown_instance_group_fails() {
        let dir = fixture();
        let gatherer = DataGatherer::new(Manifest::from_yaml(MANIFEST).unwrap(), "cf");

        let err = gatherer.gather_data(dir.path(), "api").unwrap_err();
        assert!(matches!(err, Error::InstanceGroupNotFound(ref name) if name == "api"));
    }

    #[test]
    fn gathering_leaves_the_manifest_untouched() {
        let dir = fixture();
        let manifest = Manifest::from_yaml(MANIFEST).unwrap();
        let gatherer = DataGatherer::new(manifest.clone(), "cf");

        gatherer.gather_data(dir.path(), "router").unwrap();
        assert_eq!(gatherer.manifest(), &manifest);
    }
}
