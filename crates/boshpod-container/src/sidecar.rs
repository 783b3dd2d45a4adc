//! Log tailing sidecar

use boshpod_common::k8s::{Container, EnvVar, SecurityContext, VolumeMount};
use boshpod_common::{ROOT_USER_ID, VOLUME_SYS_DIR_MOUNT_PATH};

use crate::config::ConverterConfig;

/// Name of the log sidecar container
pub const LOGS_CONTAINER_NAME: &str = "logs";
/// Name of the volume holding `/var/vcap/sys`
pub const SYS_DIR_VOLUME_NAME: &str = "sys-dir";
/// Env var naming the directory the sidecar tails
pub const ENV_LOGS_DIR: &str = "LOGS_DIR";
/// Env var holding the logrotate interval in minutes
pub const ENV_LOGROTATE_INTERVAL: &str = "LOGROTATE_INTERVAL";

/// Container tailing every log below `/var/vcap/sys/log`
pub fn logs_tailer_container(config: &ConverterConfig) -> Container {
    Container {
        name: LOGS_CONTAINER_NAME.to_string(),
        image: config.operator_image.clone(),
        image_pull_policy: Some(config.image_pull_policy.clone()),
        args: vec!["util".to_string(), "tail-logs".to_string()],
        env: vec![
            EnvVar::literal(ENV_LOGS_DIR, format!("{}/log", VOLUME_SYS_DIR_MOUNT_PATH)),
            EnvVar::literal(ENV_LOGROTATE_INTERVAL, config.logrotate_interval.to_string()),
        ],
        volume_mounts: vec![VolumeMount::new(SYS_DIR_VOLUME_NAME, VOLUME_SYS_DIR_MOUNT_PATH)],
        security_context: Some(SecurityContext {
            run_as_user: Some(ROOT_USER_ID),
            ..Default::default()
        }),
        ..Default::default()
    }
}
