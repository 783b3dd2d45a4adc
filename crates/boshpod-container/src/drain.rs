//! Drain rendezvous pre-stop hooks
//!
//! When a pod stops, the first container of every job runs the job's drain
//! script and then touches a stamp file named after the job in
//! [`DRAIN_STAMPS_DIR`]. Every container, leaders included, waits until the
//! number of stamps reaches the number of jobs with processes before exiting.
//!
//! The script text is consumed by `/bin/sh` in the running containers and
//! must not change.

use boshpod_common::k8s::{ExecAction, LifecycleHandler};
use boshpod_common::VOLUME_JOBS_DIR_MOUNT_PATH;

use crate::DRAIN_STAMPS_DIR;

/// Pre-stop hook of a job's first container: run the drain script, stamp,
/// then wait for `stamp_count` stamps.
pub fn drain_script(job: &str, stamp_count: usize) -> LifecycleHandler {
    let script = format!("{}/{}/bin/drain", VOLUME_JOBS_DIR_MOUNT_PATH, job);
    let body = format!(
        r#"
shopt -s nullglob
waitExit() {{
	e="$1"
	touch {stamps}/{job}
	echo "Waiting for other drain scripts to finish."
	while [ $(ls -1 {stamps} | wc -l) -lt {count} ]; do sleep 5; done
	exit "$e"
}}
s="{script}"
if [ ! -x "$s" ]; then
	waitExit 0
fi
echo "Running drain script $s for {job}"
while true; do
	out=$( $s )
	status=$?

	if [ "$status" -ne "0" ]; then
		echo "$s FAILED with exit code $status"
		waitExit $status
	fi

	if [ "$out" -lt "0" ]; then
		echo "Sleeping dynamic draining wait time for $s..."
		sleep ${{out:1}}
		echo "Running $s again"
	else
		echo "Sleeping static draining wait time for $s..."
		sleep $out
		echo "$s done"
		waitExit 0
	fi
done
echo "Done""#,
        stamps = DRAIN_STAMPS_DIR,
        job = job,
        count = stamp_count,
        script = script,
    );
    shell_hook(body)
}

/// Pre-stop hook of every other container: wait for `stamp_count` stamps.
pub fn drain_wait(stamp_count: usize) -> LifecycleHandler {
    let body = format!(
        r#"
echo "Wait for drain scripts in other containers to finish"
while [ $(ls -1 {stamps} | wc -l) -lt {count} ]; do sleep 5; done
exit 0
echo "Done"
"#,
        stamps = DRAIN_STAMPS_DIR,
        count = stamp_count,
    );
    shell_hook(body)
}

fn shell_hook(body: String) -> LifecycleHandler {
    LifecycleHandler {
        exec: Some(ExecAction {
            command: vec!["/bin/sh".to_string(), "-c".to_string(), body],
        }),
    }
}
