//! Event handling and response shaping
//!
//! Ties the pieces together: parse the envelope, classify, run the chosen
//! policy, and shape the outcome into the `{statusCode, body}` contract.
//! Handled outcomes, including expected no-ops, are 200; anything else is
//! 500 with the error message.

use crate::aws::backup::{BackupClient, BackupOperations};
use crate::aws::restore::{RestoreClient, RestoreOperations};
use crate::aws::AwsContext;
use crate::classifier::{classify, Action};
use crate::config::Config;
use crate::policy::{LaunchDefaults, RestoreOutcome, RestorePolicy, SnapshotPolicy, SweepResult};
use anyhow::Result;
use ec2_phoenix_common::{Event, InvocationResponse};
use serde_json::Value;
use tracing::{error, info, warn};
use uuid::Uuid;

/// The assembled controller: classifier plus both policies.
pub struct Controller<B, R> {
    snapshot: SnapshotPolicy<B>,
    restore: RestorePolicy<R>,
}

impl Controller<BackupClient, RestoreClient> {
    /// Connect to AWS and assemble the controller from configuration.
    pub async fn connect(config: &Config) -> Result<Self> {
        let ctx = AwsContext::new(&config.region).await;

        let snapshot = SnapshotPolicy::new(BackupClient::from_context(&ctx));
        let restore = RestorePolicy::new(
            RestoreClient::from_context(&ctx, config.vpc_id.clone()),
            LaunchDefaults::from_config(config),
        );

        Ok(Self::from_policies(snapshot, restore))
    }
}

impl<B, R> Controller<B, R>
where
    B: BackupOperations,
    R: RestoreOperations,
{
    /// Assemble from pre-built policies.
    pub fn from_policies(snapshot: SnapshotPolicy<B>, restore: RestorePolicy<R>) -> Self {
        Self { snapshot, restore }
    }

    /// Handle one raw event and shape the outcome into a response.
    ///
    /// Never returns an error: every failure becomes a 500 response.
    pub async fn handle(&self, raw: &Value) -> InvocationResponse {
        let invocation_id = Uuid::now_v7();
        info!(invocation_id = %invocation_id, event = %raw, "Received event");

        match self.dispatch(raw).await {
            Ok(message) => {
                info!(invocation_id = %invocation_id, message = %message, "Invocation handled");
                InvocationResponse::ok(message)
            }
            Err(err) => {
                error!(invocation_id = %invocation_id, error = ?err, "Invocation failed");
                InvocationResponse::error(format!("Error: {err:#}"))
            }
        }
    }

    async fn dispatch(&self, raw: &Value) -> Result<String> {
        let event = Event::from_value(raw)?;

        match classify(&event) {
            Action::SnapshotSweep => {
                info!("Running snapshot sweep");
                let result = self.snapshot.run_sweep().await?;
                Ok(sweep_message(&result))
            }
            Action::Restore { instance_id } => {
                info!(instance_id = %instance_id, "Running restore");
                match self.restore.run_restore(&instance_id).await? {
                    RestoreOutcome::Launched {
                        instance_id,
                        image_id,
                    } => Ok(format!("Restored instance {instance_id} from AMI {image_id}")),
                    RestoreOutcome::Skipped {
                        active_instance_ids,
                    } => Ok(format!(
                        "Instance(s) {active_instance_ids:?} already running. No new instance launched."
                    )),
                }
            }
            Action::Ignore { reason } => {
                warn!(reason = %reason, "Ignoring event");
                Ok(reason)
            }
        }
    }
}

/// Human-readable sweep summary, surfacing per-instance failures.
pub fn sweep_message(result: &SweepResult) -> String {
    if result.is_empty() {
        return "No instances to snapshot.".to_string();
    }

    let created: Vec<&str> = result
        .succeeded
        .iter()
        .map(|backup| backup.image_id.as_str())
        .collect();
    let mut message = format!(
        "Created {} AMI(s) for {} instance(s): [{}]",
        result.succeeded.len(),
        result.attempted.len(),
        created.join(", ")
    );

    if !result.failed.is_empty() {
        let failed: Vec<&str> = result
            .failed
            .iter()
            .map(|failure| failure.instance_id.as_str())
            .collect();
        message.push_str(&format!("; failed for: [{}]", failed.join(", ")));
    }

    message
}
