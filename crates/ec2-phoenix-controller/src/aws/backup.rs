//! Backup gateway: eligible-instance discovery and AMI creation

use crate::aws::context::AwsContext;
use crate::aws::error::classify_sdk_error;
use anyhow::{Context, Result};
use aws_sdk_ec2::types::{Filter, Tag};
use aws_sdk_ec2::Client;
use ec2_phoenix_common::tags::{
    self, TAG_AUTO_SNAPSHOT, TAG_AUTO_SNAPSHOT_ENABLED, TAG_CREATED_AT, TAG_ORIGINAL_INSTANCE,
};
use std::future::Future;
use tracing::{debug, info};

/// State of a backup image, collapsed to what the controller acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageState {
    Pending,
    Available,
    Failed,
}

/// Backup-side EC2 operations, abstracted so policies can be tested
/// without hitting real AWS.
pub trait BackupOperations: Send + Sync {
    /// Ids of instances tagged for backup and currently running
    fn eligible_instances(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Create an AMI from the instance; returns the image id
    fn create_backup_image(
        &self,
        instance_id: &str,
        name: &str,
        description: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Tag a created image with its backup metadata
    fn tag_backup_image(
        &self,
        image_id: &str,
        original_instance_id: &str,
        created_at: i64,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Current state of an image, or `None` while it is not yet visible
    fn image_state(&self, image_id: &str)
        -> impl Future<Output = Result<Option<ImageState>>> + Send;
}

/// EC2 client wrapper for the backup side of the controller
pub struct BackupClient {
    client: Client,
}

impl BackupClient {
    /// Create a new backup client (loads AWS config from environment)
    pub async fn new(region: &str) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx))
    }

    /// Create a backup client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
        }
    }
}

impl BackupOperations for BackupClient {
    async fn eligible_instances(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .describe_instances()
            .filters(
                Filter::builder()
                    .name(format!("tag:{TAG_AUTO_SNAPSHOT}"))
                    .values(TAG_AUTO_SNAPSHOT_ENABLED)
                    .build(),
            )
            .filters(
                Filter::builder()
                    .name("instance-state-name")
                    .values("running")
                    .build(),
            )
            .send()
            .await
            .context("Failed to describe instances")?;

        let ids: Vec<String> = response
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .filter_map(|i| i.instance_id().map(str::to_string))
            .collect();

        debug!(count = ids.len(), "Found eligible instances");

        Ok(ids)
    }

    async fn create_backup_image(
        &self,
        instance_id: &str,
        name: &str,
        description: &str,
    ) -> Result<String> {
        let response = self
            .client
            .create_image()
            .instance_id(instance_id)
            .name(name)
            .description(description)
            .no_reboot(true)
            .send()
            .await
            .context("Failed to create image")?;

        let image_id = response
            .image_id()
            .context("No image ID returned")?
            .to_string();

        info!(instance_id = %instance_id, image_id = %image_id, "Created backup image");

        Ok(image_id)
    }

    async fn tag_backup_image(
        &self,
        image_id: &str,
        original_instance_id: &str,
        created_at: i64,
    ) -> Result<()> {
        self.client
            .create_tags()
            .resources(image_id)
            .tags(
                Tag::builder()
                    .key(TAG_ORIGINAL_INSTANCE)
                    .value(original_instance_id)
                    .build(),
            )
            .tags(
                Tag::builder()
                    .key(TAG_AUTO_SNAPSHOT)
                    .value(TAG_AUTO_SNAPSHOT_ENABLED)
                    .build(),
            )
            .tags(
                Tag::builder()
                    .key(TAG_CREATED_AT)
                    .value(tags::format_created_at(created_at))
                    .build(),
            )
            .send()
            .await
            .context("Failed to tag image")?;

        debug!(image_id = %image_id, "Tagged backup image");

        Ok(())
    }

    async fn image_state(&self, image_id: &str) -> Result<Option<ImageState>> {
        let response = match self
            .client
            .describe_images()
            .image_ids(image_id)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                // A just-created image may not be visible yet
                if classify_sdk_error(&err).is_not_found() {
                    return Ok(None);
                }
                return Err(err).context("Failed to describe image");
            }
        };

        let state = response
            .images()
            .first()
            .and_then(|image| image.state())
            .map(|state| match state {
                aws_sdk_ec2::types::ImageState::Available => ImageState::Available,
                aws_sdk_ec2::types::ImageState::Failed
                | aws_sdk_ec2::types::ImageState::Invalid
                | aws_sdk_ec2::types::ImageState::Error => ImageState::Failed,
                _ => ImageState::Pending,
            });

        Ok(state)
    }
}
