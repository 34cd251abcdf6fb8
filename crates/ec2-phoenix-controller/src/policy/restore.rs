//! Restore policy: idempotency guard, backup selection, launch
//!
//! State-change notifications can race or duplicate; the active-instance
//! check is the only defense against launching two replacements for the same
//! terminated instance.

use crate::aws::restore::{BackupImage, LaunchSpec, RestoreOperations};
use crate::config::Config;
use crate::error::GuardError;
use anyhow::Result;
use tracing::info;

/// Launch settings for replacement instances, taken from configuration
#[derive(Debug, Clone)]
pub struct LaunchDefaults {
    pub instance_type: String,
    pub key_name: Option<String>,
    pub subnet_id: Option<String>,
    pub security_group_ids: Vec<String>,
    pub tag_name: String,
}

impl LaunchDefaults {
    pub fn from_config(config: &Config) -> Self {
        Self {
            instance_type: config.instance_type.clone(),
            key_name: config.key_name.clone(),
            subnet_id: config.subnet_id.clone(),
            security_group_ids: config.security_group_ids.clone(),
            tag_name: config.tag_name.clone(),
        }
    }
}

/// Outcome of one restore attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// A replacement instance was launched
    Launched {
        instance_id: String,
        image_id: String,
    },
    /// Another guarded instance is already active; nothing launched
    Skipped { active_instance_ids: Vec<String> },
}

/// Restores a terminated instance from its most recent backup.
pub struct RestorePolicy<R> {
    restore: R,
    launch: LaunchDefaults,
}

impl<R: RestoreOperations> RestorePolicy<R> {
    pub fn new(restore: R, launch: LaunchDefaults) -> Self {
        Self { restore, launch }
    }

    /// Restore `terminated_id` unless another guarded instance is active.
    pub async fn run_restore(&self, terminated_id: &str) -> Result<RestoreOutcome> {
        let active = self.restore.active_guarded_instances().await?;
        if !active.is_empty() {
            info!(active = ?active, "Active guarded instance(s) present, not launching");
            return Ok(RestoreOutcome::Skipped {
                active_instance_ids: active,
            });
        }

        let images = self.restore.backup_images_for(terminated_id).await?;
        let chosen = select_latest(&images).ok_or_else(|| GuardError::NoBackupFound {
            instance_id: terminated_id.to_string(),
        })?;

        info!(
            image_id = %chosen.image_id,
            instance_id = %terminated_id,
            "Restoring from most recent backup"
        );

        let spec = LaunchSpec {
            image_id: chosen.image_id.clone(),
            instance_type: self.launch.instance_type.clone(),
            key_name: self.launch.key_name.clone(),
            subnet_id: self.launch.subnet_id.clone(),
            security_group_ids: self.launch.security_group_ids.clone(),
            name_tag: self.launch.tag_name.clone(),
            restored_from: terminated_id.to_string(),
        };

        let instance_id = self.restore.launch_from_image(&spec).await?;

        Ok(RestoreOutcome::Launched {
            instance_id,
            image_id: chosen.image_id.clone(),
        })
    }
}

/// Most recent backup image: greatest creation date, image id as tie-break.
pub fn select_latest(images: &[BackupImage]) -> Option<&BackupImage> {
    images.iter().max_by(|a, b| {
        a.creation_date
            .cmp(&b.creation_date)
            .then_with(|| a.image_id.cmp(&b.image_id))
    })
}
