//! Common types for boshpod: manifests, job specs, BPM configs, errors and utilities

#![deny(missing_docs)]

pub mod bpm;
pub mod error;
pub mod job_spec;
pub mod k8s;
pub mod manifest;
pub mod names;
pub mod property;
pub mod quantity;
pub mod telemetry;
pub mod yaml;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Directory (relative to the base dir) holding unpacked release job sources
pub const JOBS_SRC_DIR: &str = "jobs-src";

/// Name of the job spec file inside a release job directory
pub const JOB_SPEC_FILE: &str = "job.MF";

/// Destination file name of the BPM runtime-config template
pub const BPM_CONFIG_FILE: &str = "bpm.yml";

/// Mount path of the rendered job directories inside every job container
pub const VOLUME_JOBS_DIR_MOUNT_PATH: &str = "/var/vcap/jobs";

/// Mount path of the shared rendering data (container-run lives here)
pub const VOLUME_RENDERING_DATA_MOUNT_PATH: &str = "/var/vcap/all-releases";

/// Mount path of the sys dir (logs, pid files)
pub const VOLUME_SYS_DIR_MOUNT_PATH: &str = "/var/vcap/sys";

/// Default Kubernetes cluster domain used for instance addresses
pub const DEFAULT_CLUSTER_DOMAIN: &str = "cluster.local";

/// UID used when a runtime config does not pick one
pub const ROOT_USER_ID: i64 = 0;
