//! Restore gateway: guard queries, backup lookup, and instance launch

use crate::aws::context::AwsContext;
use anyhow::{Context, Result};
use aws_sdk_ec2::types::{Filter, InstanceType, ResourceType, Tag, TagSpecification};
use aws_sdk_ec2::Client;
use ec2_phoenix_common::tags::{
    TAG_AUTO_SNAPSHOT, TAG_AUTO_SNAPSHOT_ENABLED, TAG_NAME, TAG_ORIGINAL_INSTANCE,
    TAG_RESTORED_FROM,
};
use std::future::Future;
use tracing::{debug, info};

/// An available backup image for a terminated instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupImage {
    pub image_id: String,
    /// Provider creation timestamp, RFC 3339; lexicographic order is temporal
    pub creation_date: String,
}

/// Everything needed to launch a replacement instance.
///
/// Constructed fresh per restore from configuration plus the chosen image;
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub image_id: String,
    pub instance_type: String,
    pub key_name: Option<String>,
    pub subnet_id: Option<String>,
    pub security_group_ids: Vec<String>,
    /// Name tag for the replacement
    pub name_tag: String,
    /// Terminated instance this replacement stands in for
    pub restored_from: String,
}

/// Restore-side EC2 operations, abstracted so policies can be tested
/// without hitting real AWS.
pub trait RestoreOperations: Send + Sync {
    /// Ids of guarded instances currently pending or running within the
    /// configured network boundary
    fn active_guarded_instances(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Available backup images created from the given instance
    fn backup_images_for(
        &self,
        instance_id: &str,
    ) -> impl Future<Output = Result<Vec<BackupImage>>> + Send;

    /// Launch exactly one instance from the spec; returns the new instance id
    fn launch_from_image(&self, spec: &LaunchSpec) -> impl Future<Output = Result<String>> + Send;
}

/// EC2 client wrapper for the restore side of the controller
pub struct RestoreClient {
    client: Client,
    /// Scope for the active-instance guard; `None` means the whole region
    vpc_id: Option<String>,
}

impl RestoreClient {
    /// Create a new restore client (loads AWS config from environment)
    pub async fn new(region: &str, vpc_id: Option<String>) -> Result<Self> {
        let ctx = AwsContext::new(region).await;
        Ok(Self::from_context(&ctx, vpc_id))
    }

    /// Create a restore client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext, vpc_id: Option<String>) -> Self {
        Self {
            client: ctx.ec2_client(),
            vpc_id,
        }
    }
}

impl RestoreOperations for RestoreClient {
    async fn active_guarded_instances(&self) -> Result<Vec<String>> {
        let mut filters = vec![
            Filter::builder()
                .name(format!("tag:{TAG_AUTO_SNAPSHOT}"))
                .values(TAG_AUTO_SNAPSHOT_ENABLED)
                .build(),
            Filter::builder()
                .name("instance-state-name")
                .values("pending")
                .values("running")
                .build(),
        ];

        if let Some(vpc_id) = self.vpc_id.as_deref() {
            filters.push(Filter::builder().name("vpc-id").values(vpc_id).build());
        }

        let response = self
            .client
            .describe_instances()
            .set_filters(Some(filters))
            .send()
            .await
            .context("Failed to describe active instances")?;

        let ids: Vec<String> = response
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .filter_map(|i| i.instance_id().map(str::to_string))
            .collect();

        debug!(count = ids.len(), "Found active guarded instances");

        Ok(ids)
    }

    async fn backup_images_for(&self, instance_id: &str) -> Result<Vec<BackupImage>> {
        let response = self
            .client
            .describe_images()
            .owners("self")
            .filters(
                Filter::builder()
                    .name(format!("tag:{TAG_ORIGINAL_INSTANCE}"))
                    .values(instance_id)
                    .build(),
            )
            .filters(Filter::builder().name("state").values("available").build())
            .send()
            .await
            .context("Failed to describe backup images")?;

        let images: Vec<BackupImage> = response
            .images()
            .iter()
            .filter_map(|image| {
                let image_id = image.image_id()?.to_string();
                Some(BackupImage {
                    image_id,
                    creation_date: image.creation_date().unwrap_or_default().to_string(),
                })
            })
            .collect();

        debug!(instance_id = %instance_id, count = images.len(), "Found backup images");

        Ok(images)
    }

    async fn launch_from_image(&self, spec: &LaunchSpec) -> Result<String> {
        let instance_type: InstanceType = spec
            .instance_type
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid instance type: {}", spec.instance_type))?;

        info!(
            image_id = %spec.image_id,
            instance_type = %spec.instance_type,
            "Launching replacement instance"
        );

        let mut request = self
            .client
            .run_instances()
            .image_id(&spec.image_id)
            .instance_type(instance_type)
            .min_count(1)
            .max_count(1)
            .tag_specifications(
                TagSpecification::builder()
                    .resource_type(ResourceType::Instance)
                    .tags(Tag::builder().key(TAG_NAME).value(&spec.name_tag).build())
                    .tags(
                        Tag::builder()
                            .key(TAG_RESTORED_FROM)
                            .value(&spec.restored_from)
                            .build(),
                    )
                    .tags(
                        Tag::builder()
                            .key(TAG_AUTO_SNAPSHOT)
                            .value(TAG_AUTO_SNAPSHOT_ENABLED)
                            .build(),
                    )
                    .build(),
            );

        if let Some(key_name) = spec.key_name.as_deref() {
            request = request.key_name(key_name);
        }

        if let Some(subnet_id) = spec.subnet_id.as_deref() {
            request = request.subnet_id(subnet_id);
        }

        for group in &spec.security_group_ids {
            request = request.security_group_ids(group);
        }

        let response = request.send().await.context("Failed to launch instance")?;

        let instance_id = response
            .instances()
            .first()
            .and_then(|i| i.instance_id())
            .context("No instance returned")?
            .to_string();

        info!(instance_id = %instance_id, image_id = %spec.image_id, "Launched replacement instance");

        Ok(instance_id)
    }
}
