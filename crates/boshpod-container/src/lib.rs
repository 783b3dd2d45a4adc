//! Conversion of resolved BOSH jobs into Kubernetes containers
//!
//! Every BPM process of a job becomes one container running under the
//! `container-run` supervisor. Containers of one pod coordinate shutdown
//! through the drain-stamp barrier in [`drain`]. Errand groups run their
//! processes directly without supervisor or lifecycle hooks.

#![deny(missing_docs)]

pub mod command;
pub mod config;
pub mod disks;
pub mod drain;
pub mod factory;
pub mod image;
pub mod process;
pub mod sidecar;

pub use config::ConverterConfig;
pub use disks::{BpmDisk, BpmMounts, DiskCatalog, Disks};
pub use factory::ContainerFactory;
pub use image::ReleaseImageProvider;

/// Init process wrapping every job container
pub const DUMB_INIT: &str = "/usr/bin/dumb-init";

/// Shared pod-wide directory holding one stamp per drained job
pub const DRAIN_STAMPS_DIR: &str = "/mnt/drain-stamps";
