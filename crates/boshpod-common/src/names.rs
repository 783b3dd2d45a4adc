//! Kubernetes object name helpers

/// Maximum length of a DNS label
pub const DNS_LABEL_MAX_LEN: usize = 63;

/// Sanitize a string into a valid K8s DNS label.
///
/// DNS labels: `[a-z0-9]([-a-z0-9]*[a-z0-9])?`, max 63 chars. Underscores and
/// other invalid characters become `-`.
pub fn sanitize(s: &str) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = sanitized.trim_matches('-');
    if trimmed.len() > DNS_LABEL_MAX_LEN {
        trimmed[..DNS_LABEL_MAX_LEN].trim_end_matches('-').to_string()
    } else {
        trimmed.to_string()
    }
}

/// Name of the container running `process` of `job`
pub fn container_name(job: &str, process: &str) -> String {
    sanitize(&format!("{}-{}", job, process))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_underscores_and_case() {
        assert_eq!(sanitize("Cloud_Controller"), "cloud-controller");
        assert_eq!(container_name("nats", "nats_stream"), "nats-nats-stream");
    }

    #[test]
    fn trims_edges_and_truncates() {
        assert_eq!(sanitize("_job_"), "job");
        let long = "a".repeat(80);
        assert_eq!(sanitize(&long).len(), DNS_LABEL_MAX_LEN);
    }
}
