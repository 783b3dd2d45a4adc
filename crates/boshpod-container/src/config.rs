//! Converter configuration

use serde::Deserialize;

use boshpod_common::DEFAULT_CLUSTER_DOMAIN;

/// Default operator image running the log sidecar
pub const DEFAULT_OPERATOR_IMAGE: &str = "cfcontainerization/quarks-operator:latest";

/// Default pull policy of the operator image
pub const DEFAULT_IMAGE_PULL_POLICY: &str = "IfNotPresent";

/// Default logrotate interval in minutes
pub const DEFAULT_LOGROTATE_INTERVAL: u32 = 24 * 60;

/// Settings shared by every conversion
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConverterConfig {
    /// Image of the log sidecar
    pub operator_image: String,
    /// Pull policy of the log sidecar image
    pub image_pull_policy: String,
    /// Logrotate interval passed to the log sidecar, in minutes
    pub logrotate_interval: u32,
    /// Do not append the log sidecar
    pub disable_log_sidecar: bool,
    /// Cluster domain of instance addresses
    pub cluster_domain: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            operator_image: DEFAULT_OPERATOR_IMAGE.to_string(),
            image_pull_policy: DEFAULT_IMAGE_PULL_POLICY.to_string(),
            logrotate_interval: DEFAULT_LOGROTATE_INTERVAL,
            disable_log_sidecar: false,
            cluster_domain: DEFAULT_CLUSTER_DOMAIN.to_string(),
        }
    }
}

impl ConverterConfig {
    /// Read the configuration from the process environment.
    ///
    /// `OPERATOR_DOCKER_IMAGE`, `OPERATOR_IMAGE_PULL_POLICY`,
    /// `LOGROTATE_INTERVAL` and `CLUSTER_DOMAIN` override the defaults. An
    /// unparsable interval keeps the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            operator_image: lookup("OPERATOR_DOCKER_IMAGE").unwrap_or(defaults.operator_image),
            image_pull_policy: lookup("OPERATOR_IMAGE_PULL_POLICY")
                .unwrap_or(defaults.image_pull_policy),
            logrotate_interval: lookup("LOGROTATE_INTERVAL")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.logrotate_interval),
            disable_log_sidecar: defaults.disable_log_sidecar,
            cluster_domain: lookup("CLUSTER_DOMAIN").unwrap_or(defaults.cluster_domain),
        }
    }

    /// Set the log sidecar image
    pub fn with_operator_image(mut self, image: impl Into<String>) -> Self {
        self.operator_image = image.into();
        self
    }

    /// Set the log sidecar image pull policy
    pub fn with_image_pull_policy(mut self, policy: impl Into<String>) -> Self {
        self.image_pull_policy = policy.into();
        self
    }

    /// Set the logrotate interval in minutes
    pub fn with_logrotate_interval(mut self, minutes: u32) -> Self {
        self.logrotate_interval = minutes;
        self
    }

    /// Enable or disable the log sidecar
    pub fn with_log_sidecar_disabled(mut self, disabled: bool) -> Self {
        self.disable_log_sidecar = disabled;
        self
    }

    /// Set the cluster domain
    pub fn with_cluster_domain(mut self, domain: impl Into<String>) -> Self {
        self.cluster_domain = domain.into();
        self
    }
}
