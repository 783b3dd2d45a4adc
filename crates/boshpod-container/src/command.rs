//! Container command lines

use boshpod_common::bpm::Process;
use boshpod_common::{VOLUME_JOBS_DIR_MOUNT_PATH, VOLUME_RENDERING_DATA_MOUNT_PATH};

use crate::DUMB_INIT;

/// A post-start command of the `container-run` supervisor
#[derive(Clone, Debug, PartialEq)]
pub struct PostStartCommand {
    /// Executable
    pub name: String,
    /// Arguments
    pub args: Vec<String>,
}

/// Post-start settings passed to `container-run`
///
/// Only the first process container of a job runs the job's post-start script.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PostStart {
    /// The job's post-start script
    pub command: Option<PostStartCommand>,
    /// Condition the script waits for before running
    pub condition: Option<PostStartCommand>,
}

impl PostStart {
    /// Post-start settings for the first process of `job`
    pub fn for_job(job: &str, condition: Option<&[String]>) -> Self {
        Self {
            command: Some(PostStartCommand {
                name: format!("{}/{}/bin/post-start", VOLUME_JOBS_DIR_MOUNT_PATH, job),
                args: Vec::new(),
            }),
            condition: condition
                .and_then(|cmd| cmd.split_first())
                .map(|(name, args)| PostStartCommand {
                    name: name.clone(),
                    args: args.to_vec(),
                }),
        }
    }
}

/// Path of the `container-run` supervisor
pub fn container_run_path() -> String {
    format!("{}/container-run/container-run", VOLUME_RENDERING_DATA_MOUNT_PATH)
}

/// Init command of every job container
pub fn init_command() -> Vec<String> {
    vec![DUMB_INIT.to_string(), "--".to_string()]
}

/// Command and args running `process` of `job` under `container-run`
pub fn bpm_command(job: &str, process: &Process, post_start: &PostStart) -> (Vec<String>, Vec<String>) {
    let mut args = vec![container_run_path()];
    if let Some(command) = &post_start.command {
        args.extend(["--post-start-name".to_string(), command.name.clone()]);
        if let Some(condition) = &post_start.condition {
            args.extend([
                "--post-start-condition-name".to_string(),
                condition.name.clone(),
            ]);
            for arg in &condition.args {
                args.extend(["--post-start-condition-arg".to_string(), arg.clone()]);
            }
        }
    }
    args.extend([
        "--job-name".to_string(),
        job.to_string(),
        "--process-name".to_string(),
        process.name.clone(),
        "--".to_string(),
        process.executable.clone(),
    ]);
    args.extend(process.args.iter().cloned());
    (init_command(), args)
}

/// Command and args running an errand process directly
pub fn errand_command(process: &Process) -> (Vec<String>, Vec<String>) {
    let args = std::iter::once(process.executable.clone())
        .chain(process.args.iter().cloned())
        .collect();
    (init_command(), args)
}
