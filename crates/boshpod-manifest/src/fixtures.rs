//! On-disk release fixtures for tests

use std::fs;
use std::path::Path;

use boshpod_common::{JOBS_SRC_DIR, JOB_SPEC_FILE};

/// Write `jobs-src/<release>/<job>/job.MF` and its templates under `base`
pub fn write_job(base: &Path, release: &str, job: &str, job_mf: &str, templates: &[(&str, &str)]) {
    let job_dir = base.join(JOBS_SRC_DIR).join(release).join(job);
    fs::create_dir_all(job_dir.join("templates")).unwrap();
    fs::write(job_dir.join(JOB_SPEC_FILE), job_mf).unwrap();
    for (name, content) in templates {
        fs::write(job_dir.join("templates").join(name), content).unwrap();
    }
}
