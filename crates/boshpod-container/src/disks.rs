//! BPM disks and volume mount assembly
//!
//! A [`Disks`] list holds the volumes prepared for an instance group. Each disk
//! is labeled with the job (`job_name`) and optionally the process
//! (`process_name`) it belongs to. Ephemeral and persistent job disks are
//! marked with `ephemeral: "true"` or `persistent: "true"`.

use std::collections::{BTreeMap, HashSet};

#[cfg(test)]
use mockall::automock;

use boshpod_common::k8s::VolumeMount;

/// Label naming the job a disk belongs to
pub const LABEL_JOB_NAME: &str = "job_name";
/// Label naming the process a disk belongs to
pub const LABEL_PROCESS_NAME: &str = "process_name";
/// Label marking the job's ephemeral disk
pub const LABEL_EPHEMERAL: &str = "ephemeral";
/// Label marking the job's persistent disk
pub const LABEL_PERSISTENT: &str = "persistent";

/// Ephemeral and persistent mounts of one job
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BpmMounts {
    /// Ephemeral data disk
    pub ephemeral: Option<VolumeMount>,
    /// Persistent disk
    pub persistent: Option<VolumeMount>,
}

/// Source of the extra volume mounts of job containers
#[cfg_attr(test, automock)]
pub trait DiskCatalog {
    /// Ephemeral and persistent mounts of `job`
    fn bpm_mounts(&self, job: &str) -> BpmMounts;

    /// Additional mounts of `process` in `job`
    fn process_mounts(&self, job: &str, process: &str) -> Vec<VolumeMount>;
}

/// A volume prepared for BPM processes
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BpmDisk {
    /// Mount in the container, if the disk is mounted directly
    pub volume_mount: Option<VolumeMount>,
    /// Labels scoping the disk to a job or process
    pub labels: BTreeMap<String, String>,
}

impl BpmDisk {
    /// A disk mounted at `mount`
    pub fn new(mount: VolumeMount) -> Self {
        Self {
            volume_mount: Some(mount),
            labels: BTreeMap::new(),
        }
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    fn has_label(&self, key: &str, value: &str) -> bool {
        self.labels.get(key).is_some_and(|v| v == value)
    }
}

/// Labeled list of BPM disks
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Disks(pub Vec<BpmDisk>);

impl Disks {
    /// Disks whose `key` label equals `value`
    pub fn filter(&self, key: &str, value: &str) -> Disks {
        Disks(
            self.0
                .iter()
                .filter(|d| d.has_label(key, value))
                .cloned()
                .collect(),
        )
    }

    /// Volume mounts of all disks, in order
    pub fn volume_mounts(&self) -> Vec<VolumeMount> {
        self.0.iter().filter_map(|d| d.volume_mount.clone()).collect()
    }

    fn first_marked(&self, label: &str) -> Option<VolumeMount> {
        self.0
            .iter()
            .find(|d| d.has_label(label, "true"))
            .and_then(|d| d.volume_mount.clone())
    }
}

impl DiskCatalog for Disks {
    fn bpm_mounts(&self, job: &str) -> BpmMounts {
        let job_disks = self.filter(LABEL_JOB_NAME, job);
        BpmMounts {
            ephemeral: job_disks.first_marked(LABEL_EPHEMERAL),
            persistent: job_disks.first_marked(LABEL_PERSISTENT),
        }
    }

    fn process_mounts(&self, job: &str, process: &str) -> Vec<VolumeMount> {
        self.filter(LABEL_JOB_NAME, job)
            .filter(LABEL_PROCESS_NAME, process)
            .volume_mounts()
    }
}

/// Mounts of one process container: defaults, process mounts, ephemeral and
/// persistent disk, in that order, without repeated mount paths.
pub fn container_mounts(
    defaults: &[VolumeMount],
    process: Vec<VolumeMount>,
    bpm: &BpmMounts,
) -> Vec<VolumeMount> {
    let all = defaults
        .iter()
        .cloned()
        .chain(process)
        .chain(bpm.ephemeral.clone())
        .chain(bpm.persistent.clone())
        .collect();
    dedupe_mounts(all)
}

/// Drop mounts whose path was already mounted; the first occurrence wins
pub fn dedupe_mounts(mounts: Vec<VolumeMount>) -> Vec<VolumeMount> {
    let mut seen = HashSet::new();
    mounts
        .into_iter()
        .filter(|m| seen.insert(m.mount_path.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disks() -> Disks {
        Disks(vec![
            BpmDisk::new(VolumeMount::new("ephemeral", "/var/vcap/data/nats"))
                .with_label(LABEL_JOB_NAME, "nats")
                .with_label(LABEL_EPHEMERAL, "true"),
            BpmDisk::new(VolumeMount::new("store", "/var/vcap/store/nats"))
                .with_label(LABEL_JOB_NAME, "nats")
                .with_label(LABEL_PERSISTENT, "true"),
            BpmDisk::new(VolumeMount::new("extra", "/var/vcap/data/nats/extra"))
                .with_label(LABEL_JOB_NAME, "nats")
                .with_label(LABEL_PROCESS_NAME, "nats"),
            BpmDisk::new(VolumeMount::new("other", "/var/vcap/data/router"))
                .with_label(LABEL_JOB_NAME, "router")
                .with_label(LABEL_EPHEMERAL, "true"),
            BpmDisk {
                volume_mount: None,
                labels: [(LABEL_JOB_NAME.to_string(), "nats".to_string())].into(),
            },
        ])
    }

    #[test]
    fn bpm_mounts_are_scoped_to_the_job() {
        let mounts = disks().bpm_mounts("nats");
        assert_eq!(mounts.ephemeral.unwrap().name, "ephemeral");
        assert_eq!(mounts.persistent.unwrap().name, "store");

        let router = disks().bpm_mounts("router");
        assert_eq!(router.ephemeral.unwrap().name, "other");
        assert!(router.persistent.is_none());

        assert_eq!(disks().bpm_mounts("api"), BpmMounts::default());
    }

    #[test]
    fn process_mounts_need_job_and_process_labels() {
        let mounts = disks().process_mounts("nats", "nats");
        assert_eq!(mounts, vec![VolumeMount::new("extra", "/var/vcap/data/nats/extra")]);
        assert!(disks().process_mounts("router", "nats").is_empty());
    }

    #[test]
    fn container_mounts_keep_order_and_first_path() {
        let defaults = vec![
            VolumeMount::new("rendering-data", "/var/vcap/all-releases"),
            VolumeMount::new("jobs-dir", "/var/vcap/jobs"),
        ];
        let process = vec![
            VolumeMount::new("extra", "/var/vcap/data/nats/extra"),
            VolumeMount::new("shadow", "/var/vcap/jobs"),
        ];
        let bpm = BpmMounts {
            ephemeral: Some(VolumeMount::new("ephemeral", "/var/vcap/data/nats")),
            persistent: Some(VolumeMount::new("store", "/var/vcap/store/nats")),
        };

        let names: Vec<_> = container_mounts(&defaults, process, &bpm)
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(
            names,
            vec!["rendering-data", "jobs-dir", "extra", "ephemeral", "store"]
        );
    }
}
