//! Base-image resolution via SSM
//!
//! Operator helper for resolving the current Amazon Linux 2 AMI. Not on the
//! restore path: restores only ever launch from this controller's own
//! backups.

use crate::aws::context::AwsContext;
use ec2_phoenix_common::defaults::{BASE_IMAGE_PARAMETER, FALLBACK_BASE_IMAGE};
use tracing::{debug, warn};

/// SSM client wrapper
pub struct SsmClient {
    client: aws_sdk_ssm::Client,
}

impl SsmClient {
    /// Create a new SSM client (loads AWS config from environment)
    pub async fn new(region: &str) -> Self {
        let ctx = AwsContext::new(region).await;
        Self::from_context(&ctx)
    }

    /// Create an SSM client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ssm_client(),
        }
    }

    /// Resolve the current base image id, falling back to a known-good id
    /// when the parameter lookup fails.
    pub async fn resolve_base_image(&self) -> String {
        match self
            .client
            .get_parameter()
            .name(BASE_IMAGE_PARAMETER)
            .send()
            .await
        {
            Ok(response) => {
                if let Some(value) = response.parameter().and_then(|p| p.value()) {
                    debug!(image_id = %value, "Resolved base image from SSM");
                    return value.to_string();
                }
                warn!("SSM parameter had no value. Using fallback base image.");
                FALLBACK_BASE_IMAGE.to_string()
            }
            Err(err) => {
                warn!(error = %err, "Failed to resolve base image from SSM. Using fallback.");
                FALLBACK_BASE_IMAGE.to_string()
            }
        }
    }
}
