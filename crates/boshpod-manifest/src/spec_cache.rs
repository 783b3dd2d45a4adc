//! Cache of release job specs loaded from disk

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use boshpod_common::job_spec::JobSpec;
use boshpod_common::yaml::from_yaml_str;
use boshpod_common::{Error, Result, JOBS_SRC_DIR, JOB_SPEC_FILE};

/// Job specs keyed by (release, job), read from
/// `<base_dir>/jobs-src/<release>/<job>/job.MF` on first use.
#[derive(Debug)]
pub struct JobSpecCache {
    base_dir: PathBuf,
    specs: HashMap<(String, String), JobSpec>,
}

impl JobSpecCache {
    /// Create an empty cache rooted at `base_dir`
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            specs: HashMap::new(),
        }
    }

    /// Source directory of one release job
    pub fn job_dir(&self, release: &str, job: &str) -> PathBuf {
        self.base_dir.join(JOBS_SRC_DIR).join(release).join(job)
    }

    /// Path of a template file of one release job
    pub fn template_path(&self, release: &str, job: &str, template: &str) -> PathBuf {
        self.job_dir(release, job).join("templates").join(template)
    }

    /// Load a job spec, reading it from disk only the first time
    pub fn load(&mut self, release: &str, job: &str) -> Result<&JobSpec> {
        match self.specs.entry((release.to_string(), job.to_string())) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = self
                    .base_dir
                    .join(JOBS_SRC_DIR)
                    .join(release)
                    .join(job)
                    .join(JOB_SPEC_FILE);
                let spec = read_spec(&path, release, job)?;
                debug!(release = %release, job = %job, path = %path.display(), "loaded job spec");
                Ok(entry.insert(spec))
            }
        }
    }

    /// A previously loaded job spec
    pub fn get(&self, release: &str, job: &str) -> Option<&JobSpec> {
        self.specs.get(&(release.to_string(), job.to_string()))
    }

    /// Number of cached specs
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether no spec has been loaded yet
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

fn read_spec(path: &Path, release: &str, job: &str) -> Result<JobSpec> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::spec_load(release, job, format!("{}: {}", path.display(), e)))?;
    from_yaml_str(&content).map_err(|e| Error::spec_load(release, job, e.to_string()))
}
