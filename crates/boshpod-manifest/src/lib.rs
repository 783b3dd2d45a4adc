//! Link resolution and BPM rendering for BOSH deployment manifests
//!
//! The gathering pass runs in three steps over one manifest:
//!
//! 1. [`LinkResolver::collect_specs_and_links`] loads every job's `job.MF`,
//!    computes job instances and registers the links each job provides.
//! 2. [`LinkResolver::resolve_consumers`] attaches provided links to the jobs
//!    of one instance group.
//! 3. [`render_runtime_config`] renders each of those jobs' `bpm.yml` template
//!    per instance and stores the parsed BPM config.
//!
//! [`DataGatherer`] drives all three for a single instance group.

#![deny(missing_docs)]

pub mod gatherer;
pub mod instances;
pub mod links;
pub mod renderer;
pub mod spec_cache;
pub mod template;

pub use gatherer::DataGatherer;
pub use instances::compute_instances;
pub use links::{LinkResolver, ProviderTable};
pub use renderer::render_runtime_config;
pub use spec_cache::JobSpecCache;

#[cfg(test)]
pub(crate) mod fixtures;
