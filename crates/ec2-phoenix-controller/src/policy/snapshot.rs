//! Snapshot sweep policy
//!
//! One pass of creating AMI backups for every eligible instance. Image
//! creation is asynchronous on the provider side and is not awaited on the
//! primary path; a bounded polling helper is available for callers that want
//! to verify availability.

use crate::aws::backup::{BackupOperations, ImageState};
use crate::error::GuardError;
use anyhow::Result;
use chrono::Utc;
use ec2_phoenix_common::{defaults, tags};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Polling bounds for waiting on image availability
#[derive(Debug, Clone)]
pub struct WaitConfig {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::POLL_MAX_ATTEMPTS,
            delay: Duration::from_secs(defaults::POLL_DELAY_SECS),
        }
    }
}

/// One successfully created backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedBackup {
    pub instance_id: String,
    pub image_id: String,
}

/// One instance whose backup failed
#[derive(Debug, Clone)]
pub struct SweepFailure {
    pub instance_id: String,
    pub error: String,
}

/// Per-instance outcome of one sweep
#[derive(Debug, Clone, Default)]
pub struct SweepResult {
    pub attempted: Vec<String>,
    pub succeeded: Vec<CreatedBackup>,
    pub failed: Vec<SweepFailure>,
}

impl SweepResult {
    /// No eligible instances existed
    pub fn is_empty(&self) -> bool {
        self.attempted.is_empty()
    }
}

/// Backs up every eligible instance in one pass.
pub struct SnapshotPolicy<B> {
    backup: B,
    wait: WaitConfig,
    verify_available: bool,
}

impl<B: BackupOperations> SnapshotPolicy<B> {
    pub fn new(backup: B) -> Self {
        Self {
            backup,
            wait: WaitConfig::default(),
            verify_available: false,
        }
    }

    /// Verify each created image reaches `available` before reporting success.
    pub fn with_verify_available(mut self, verify: bool) -> Self {
        self.verify_available = verify;
        self
    }

    /// Override the polling bounds.
    pub fn with_wait_config(mut self, config: WaitConfig) -> Self {
        self.wait = config;
        self
    }

    /// Run one sweep over all eligible instances.
    ///
    /// A failure on one instance is recorded and the sweep moves on to its
    /// siblings; only a failing eligibility query aborts the sweep.
    pub async fn run_sweep(&self) -> Result<SweepResult> {
        let instance_ids = self.backup.eligible_instances().await?;

        if instance_ids.is_empty() {
            info!("No tagged instances found for snapshot");
            return Ok(SweepResult::default());
        }

        let mut result = SweepResult {
            attempted: instance_ids.clone(),
            ..Default::default()
        };

        for instance_id in &instance_ids {
            match self.backup_one(instance_id).await {
                Ok(image_id) => {
                    result.succeeded.push(CreatedBackup {
                        instance_id: instance_id.clone(),
                        image_id,
                    });
                }
                Err(err) => {
                    error!(instance_id = %instance_id, error = ?err, "Failed to create backup");
                    result.failed.push(SweepFailure {
                        instance_id: instance_id.clone(),
                        error: format!("{err:#}"),
                    });
                }
            }
        }

        info!(
            attempted = result.attempted.len(),
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            "Sweep complete"
        );

        Ok(result)
    }

    async fn backup_one(&self, instance_id: &str) -> Result<String> {
        let created_at = Utc::now().timestamp();
        let name = tags::backup_image_name(instance_id, created_at);
        let description = tags::backup_image_description(instance_id);

        let image_id = self
            .backup
            .create_backup_image(instance_id, &name, &description)
            .await?;
        self.backup
            .tag_backup_image(&image_id, instance_id, created_at)
            .await?;

        if self.verify_available {
            self.wait_until_available(&image_id).await?;
        }

        Ok(image_id)
    }

    /// Poll the image until it reaches a terminal state.
    ///
    /// Tolerates the image not being visible yet. Fails with
    /// [`GuardError::ImageFailed`] on a failed terminal state and
    /// [`GuardError::PollTimeout`] when the polling budget runs out.
    pub async fn wait_until_available(&self, image_id: &str) -> Result<()> {
        for attempt in 1..=self.wait.max_attempts {
            match self.backup.image_state(image_id).await? {
                Some(ImageState::Available) => {
                    info!(image_id = %image_id, attempt, "Image is available");
                    return Ok(());
                }
                Some(ImageState::Failed) => {
                    return Err(GuardError::ImageFailed {
                        image_id: image_id.to_string(),
                    }
                    .into());
                }
                Some(ImageState::Pending) => {
                    debug!(
                        image_id = %image_id,
                        attempt,
                        max_attempts = self.wait.max_attempts,
                        "Image still pending"
                    );
                }
                None => {
                    warn!(image_id = %image_id, attempt, "Image not visible yet, retrying");
                }
            }

            tokio::time::sleep(self.wait.delay).await;
        }

        Err(GuardError::PollTimeout {
            image_id: image_id.to_string(),
            attempts: self.wait.max_attempts,
        }
        .into())
    }
}
