//! BOSH link resolution
//!
//! Providers are collected across the whole deployment into a [`ProviderTable`]
//! keyed by (type, name). Consumers are then resolved per job against that
//! table, honoring the manifest's `as`, `from` and explicit nil overrides.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::debug;

use boshpod_common::job_spec::{JobSpec, ProvidedLink};
use boshpod_common::manifest::{Job, JobLink, Manifest};
use boshpod_common::{property, Error, Result, DEFAULT_CLUSTER_DOMAIN};

use crate::instances::compute_instances;
use crate::spec_cache::JobSpecCache;

/// Provided links of a deployment keyed by (type, name)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProviderTable {
    links: BTreeMap<(String, String), JobLink>,
}

impl ProviderTable {
    /// Register a provider. A second provider with the same type and name is
    /// rejected and leaves the table unchanged.
    pub fn register(&mut self, link_type: &str, name: &str, link: JobLink) -> Result<()> {
        let key = (link_type.to_string(), name.to_string());
        if self.links.contains_key(&key) {
            return Err(Error::DuplicateProvider {
                link_type: link_type.to_string(),
                name: name.to_string(),
            });
        }
        self.links.insert(key, link);
        Ok(())
    }

    /// Look up a provider
    pub fn get(&self, link_type: &str, name: &str) -> Option<&JobLink> {
        self.links.get(&(link_type.to_string(), name.to_string()))
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether no provider is registered
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Resolves job specs, instances and links for one deployment manifest.
///
/// Owns the job spec cache and provider table for a single compilation pass.
#[derive(Debug)]
pub struct LinkResolver {
    specs: JobSpecCache,
    providers: ProviderTable,
    namespace: String,
    cluster_domain: String,
}

impl LinkResolver {
    /// Create a resolver reading job specs below `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            specs: JobSpecCache::new(base_dir),
            providers: ProviderTable::default(),
            namespace: namespace.into(),
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
        }
    }

    /// Use a cluster domain other than `cluster.local` for instance addresses
    pub fn with_cluster_domain(mut self, cluster_domain: impl Into<String>) -> Self {
        self.cluster_domain = cluster_domain.into();
        self
    }

    /// Job specs loaded so far
    pub fn specs(&self) -> &JobSpecCache {
        &self.specs
    }

    /// Providers registered so far
    pub fn providers(&self) -> &ProviderTable {
        &self.providers
    }

    /// Load every job's spec, compute its instances and register the links it
    /// provides.
    ///
    /// Instances are stored on each job's resolved data.
    pub fn collect_specs_and_links(&mut self, manifest: &mut Manifest) -> Result<()> {
        for group in &mut manifest.instance_groups {
            for idx in 0..group.jobs.len() {
                let instances = compute_instances(
                    group,
                    &group.jobs[idx].name,
                    &self.namespace,
                    &self.cluster_domain,
                );

                let job = &mut group.jobs[idx];
                let spec = self.specs.load(&job.release, &job.name)?;
                for provided in &spec.provides {
                    let link = JobLink {
                        instances: instances.clone(),
                        properties: provider_properties(spec, provided, job),
                    };
                    let name = provider_name(job, &provided.name)?;
                    self.providers.register(&provided.link_type, &name, link)?;
                    debug!(
                        job = %job.name,
                        link_type = %provided.link_type,
                        name = %name,
                        "registered link provider"
                    );
                }
                job.resolved.instances = instances;
            }
        }
        Ok(())
    }

    /// Attach the links consumed by `job` to its resolved data.
    ///
    /// The job's spec must have been loaded by [`Self::collect_specs_and_links`].
    pub fn resolve_consumers(&self, job: &mut Job) -> Result<()> {
        let spec = self.specs.get(&job.release, &job.name).ok_or_else(|| {
            Error::spec_load(&job.release, &job.name, "job spec was not collected")
        })?;

        for consumer in &spec.consumes {
            let name = match job.consumes.get(&consumer.name) {
                Some(entry) if is_explicit_nil(entry) && consumer.optional => {
                    debug!(job = %job.name, consumer = %consumer.name, "optional link disabled in manifest");
                    continue;
                }
                Some(entry) if is_explicit_nil(entry) => {
                    return Err(Error::MandatoryLinkNil {
                        job: job.name.clone(),
                        consumer: consumer.name.clone(),
                    })
                }
                Some(Value::Object(entry)) => {
                    name_override(entry, "from").unwrap_or_else(|| consumer.name.clone())
                }
                Some(other) => {
                    return Err(Error::invalid_manifest(
                        &job.name,
                        format!(
                            "consumes entry '{}' should be a map, got {}",
                            consumer.name, other
                        ),
                    ))
                }
                None => consumer.name.clone(),
            };

            match self.providers.get(&consumer.link_type, &name) {
                Some(link) => {
                    job.resolved
                        .consumes
                        .insert(consumer.name.clone(), link.clone());
                }
                None if consumer.optional => {
                    debug!(
                        job = %job.name,
                        consumer = %consumer.name,
                        link_type = %consumer.link_type,
                        "no provider for optional link"
                    );
                }
                None => {
                    return Err(Error::UnresolvedLink {
                        job: job.name.clone(),
                        consumer: consumer.name.clone(),
                        link_type: consumer.link_type.clone(),
                        name,
                    })
                }
            }
        }
        Ok(())
    }
}

// Each declared property is set at its own dotted path: the manifest override
// if present, otherwise the spec default. Dotted names sharing a prefix merge.
fn provider_properties(spec: &JobSpec, provided: &ProvidedLink, job: &Job) -> Map<String, Value> {
    let mut properties = Map::new();
    for name in &provided.properties {
        let value = job
            .property(name)
            .cloned()
            .unwrap_or_else(|| spec.property_default(name));
        property::set_path(&mut properties, name, value);
    }
    properties
}

// Name the provider is registered under, after applying an `as` alias.
fn provider_name(job: &Job, provider: &str) -> Result<String> {
    match job.provides.get(provider) {
        None => Ok(provider.to_string()),
        Some(Value::Object(entry)) => {
            Ok(name_override(entry, "as").unwrap_or_else(|| provider.to_string()))
        }
        Some(other) => Err(Error::invalid_manifest(
            &job.name,
            format!("provides entry '{}' should be a map, got {}", provider, other),
        )),
    }
}

// `db: ~` and the BOSH spelling `db: nil` both disable a link.
fn is_explicit_nil(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s == "nil",
        _ => false,
    }
}

// An `as`/`from` rename; a null value counts as unset.
fn name_override(entry: &Map<String, Value>, key: &str) -> Option<String> {
    match entry.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
