//! Job instance identities

use boshpod_common::manifest::{InstanceGroup, JobInstance};

/// Compute the instances of `job_name` in `group`.
///
/// One instance per replica and AZ, replica-major. A group without AZs gets a
/// single empty AZ. Indices are dense across both loops.
pub fn compute_instances(
    group: &InstanceGroup,
    job_name: &str,
    namespace: &str,
    cluster_domain: &str,
) -> Vec<JobInstance> {
    let azs: Vec<&str> = if group.azs.is_empty() {
        vec![""]
    } else {
        group.azs.iter().map(String::as_str).collect()
    };
    let name = format!("{}-{}", group.name, job_name);

    (0..group.instances)
        .flat_map(|replica| azs.iter().map(move |az| (replica, *az)))
        .enumerate()
        .map(|(index, (replica, az))| {
            let id = format!("{}-{}-{}", group.name, index, job_name);
            JobInstance {
                address: format!("{}.{}.svc.{}", id, namespace, cluster_domain),
                az: az.to_string(),
                id,
                index,
                instance: replica,
                name: name.clone(),
            }
        })
        .collect()
}
