//! Error types for manifest compilation
//!
//! Every variant is fatal for the conversion it occurs in. Errors carry the
//! job, release or link they refer to so the failing part of a deployment can
//! be found without re-running with extra logging.

use thiserror::Error;

/// Main error type for boshpod operations
#[derive(Debug, Error)]
pub enum Error {
    /// A release job spec (job.MF) could not be read or parsed
    #[error("failed to load job spec for {release}/{job}: {message}")]
    SpecLoad {
        /// Release the job belongs to
        release: String,
        /// Job name
        job: String,
        /// Description of what failed
        message: String,
    },

    /// Two jobs registered a provider with the same (type, name)
    #[error("multiple providers for link: name={name} type={link_type}")]
    DuplicateProvider {
        /// Link type
        link_type: String,
        /// Resolved provider name (after `as` renaming)
        name: String,
    },

    /// A mandatory consumer was explicitly set to nil in the manifest
    #[error("mandatory link of consumer {consumer} in job {job} is explicitly set to nil")]
    MandatoryLinkNil {
        /// Consuming job
        job: String,
        /// Consumer name as declared in the job spec
        consumer: String,
    },

    /// A mandatory consumer has no matching provider
    #[error("cannot resolve non-optional link for consumer {consumer} in job {job} (type={link_type}, name={name})")]
    UnresolvedLink {
        /// Consuming job
        job: String,
        /// Consumer name as declared in the job spec
        consumer: String,
        /// Link type
        link_type: String,
        /// Provider name looked up (after `from` override)
        name: String,
    },

    /// The job spec has no template rendering to bpm.yml
    #[error("can't find BPM template for job {job}")]
    TemplateNotFound {
        /// Job name
        job: String,
    },

    /// Rendering or parsing the BPM template failed
    #[error("failed to render BPM config for job {job}: {message}")]
    TemplateRender {
        /// Job name
        job: String,
        /// Description of what failed
        message: String,
    },

    /// A resource limit is not a valid quantity
    #[error("error parsing {field} limit '{value}' for {job}/{process}: {message}")]
    QuantityParse {
        /// Limit field (memory or cpu)
        field: String,
        /// The raw value
        value: String,
        /// Job name
        job: String,
        /// Process name
        process: String,
        /// Description of what is wrong
        message: String,
    },

    /// The release image for a job could not be determined
    #[error("failed to look up image for job {job} in instance group {instance_group}: {message}")]
    ImageLookup {
        /// Instance group name
        instance_group: String,
        /// Job name
        job: String,
        /// Description of what failed
        message: String,
    },

    /// No BPM config was resolved for a job handed to the container factory
    #[error("failed to lookup bpm config for bosh job '{job}' in bpm configs")]
    MissingRuntimeConfig {
        /// Job name
        job: String,
    },

    /// The requested instance group does not exist in the manifest
    #[error("can't find instance group '{0}' in manifest")]
    InstanceGroupNotFound(String),

    /// Structurally invalid manifest content
    #[error("invalid manifest for job {job}: {message}")]
    InvalidManifest {
        /// Job name
        job: String,
        /// Description of what is wrong
        message: String,
    },

    /// YAML syntax error
    #[error("yaml error: {0}")]
    Yaml(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a job spec load error
    pub fn spec_load(
        release: impl Into<String>,
        job: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::SpecLoad {
            release: release.into(),
            job: job.into(),
            message: message.into(),
        }
    }

    /// Create a template render error
    pub fn template_render(job: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TemplateRender {
            job: job.into(),
            message: message.into(),
        }
    }

    /// Create an invalid manifest error
    pub fn invalid_manifest(job: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidManifest {
            job: job.into(),
            message: message.into(),
        }
    }

    /// Create an image lookup error
    pub fn image_lookup(
        instance_group: impl Into<String>,
        job: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ImageLookup {
            instance_group: instance_group.into(),
            job: job.into(),
            message: message.into(),
        }
    }

    /// Create a missing runtime config error
    pub fn missing_runtime_config(job: impl Into<String>) -> Self {
        Self::MissingRuntimeConfig { job: job.into() }
    }
}
