//! boshpod - compiles BOSH deployment manifests into Kubernetes containers
//!
//! For one instance group of a deployment, boshpod resolves BOSH links across
//! the whole manifest, renders each job's `bpm.yml` per instance and turns
//! every BPM process into a container spec.
//!
//! # Crates
//!
//! - [`boshpod_common`] - manifest, job spec, BPM and Kubernetes types, errors
//! - [`boshpod_manifest`] - link resolution and BPM template rendering
//! - [`boshpod_container`] - container construction and drain coordination
//!
//! # Modules
//!
//! - [`compiler`] - the end-to-end pipeline for one instance group

#![deny(missing_docs)]

pub mod compiler;

pub use boshpod_common::{Error, Result};
pub use compiler::{CompiledInstanceGroup, InstanceGroupCompiler};
