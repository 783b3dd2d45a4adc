//! Release image lookup

#[cfg(test)]
use mockall::automock;

use boshpod_common::Result;

/// Resolves the container image a job's release is packaged in
///
/// Implemented by the caller, who knows the release stemcells and registries.
#[cfg_attr(test, automock)]
pub trait ReleaseImageProvider {
    /// Image for `job` of `instance_group`
    ///
    /// Failures should be reported as `Error::ImageLookup`.
    fn release_image(&self, instance_group: &str, job: &str) -> Result<String>;
}
