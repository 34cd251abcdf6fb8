//! End-to-end handler tests over fake gateways
//!
//! Exercises the full event -> classify -> policy -> response path and pins
//! the `{statusCode, body}` contract for every event shape.

use anyhow::{anyhow, Result};
use ec2_phoenix_controller::aws::backup::{BackupOperations, ImageState};
use ec2_phoenix_controller::aws::restore::{BackupImage, LaunchSpec, RestoreOperations};
use ec2_phoenix_controller::handler::Controller;
use ec2_phoenix_controller::policy::{LaunchDefaults, RestorePolicy, SnapshotPolicy};
use serde_json::json;
use std::sync::Mutex;

#[derive(Default)]
struct FakeBackup {
    instances: Vec<String>,
    fail_create_for: Vec<String>,
}

impl FakeBackup {
    fn with_instances(ids: &[&str]) -> Self {
        Self {
            instances: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }
}

impl BackupOperations for FakeBackup {
    async fn eligible_instances(&self) -> Result<Vec<String>> {
        Ok(self.instances.clone())
    }

    async fn create_backup_image(
        &self,
        instance_id: &str,
        _name: &str,
        _description: &str,
    ) -> Result<String> {
        if self.fail_create_for.iter().any(|i| i == instance_id) {
            return Err(anyhow!("create_image denied"));
        }
        Ok(format!("ami-{instance_id}"))
    }

    async fn tag_backup_image(
        &self,
        _image_id: &str,
        _original_instance_id: &str,
        _created_at: i64,
    ) -> Result<()> {
        Ok(())
    }

    async fn image_state(&self, _image_id: &str) -> Result<Option<ImageState>> {
        Ok(Some(ImageState::Available))
    }
}

/// A successful launch makes the replacement visible to later guard
/// queries, like the real provider does.
#[derive(Default)]
struct FakeRestore {
    active: Mutex<Vec<String>>,
    images: Vec<BackupImage>,
    launched: Mutex<Vec<LaunchSpec>>,
}

impl RestoreOperations for FakeRestore {
    async fn active_guarded_instances(&self) -> Result<Vec<String>> {
        Ok(self.active.lock().unwrap().clone())
    }

    async fn backup_images_for(&self, _instance_id: &str) -> Result<Vec<BackupImage>> {
        Ok(self.images.clone())
    }

    async fn launch_from_image(&self, spec: &LaunchSpec) -> Result<String> {
        self.launched.lock().unwrap().push(spec.clone());
        self.active.lock().unwrap().push("i-replacement".to_string());
        Ok("i-replacement".to_string())
    }
}

fn launch_defaults() -> LaunchDefaults {
    LaunchDefaults {
        instance_type: "t3.micro".to_string(),
        key_name: Some("ops-key".to_string()),
        subnet_id: Some("subnet-0a1b".to_string()),
        security_group_ids: vec!["sg-1".to_string()],
        tag_name: "ec2-snapshot".to_string(),
    }
}

fn controller(
    backup: FakeBackup,
    restore: FakeRestore,
) -> Controller<FakeBackup, FakeRestore> {
    Controller::from_policies(
        SnapshotPolicy::new(backup),
        RestorePolicy::new(restore, launch_defaults()),
    )
}

fn backup_image(image_id: &str, creation_date: &str) -> BackupImage {
    BackupImage {
        image_id: image_id.to_string(),
        creation_date: creation_date.to_string(),
    }
}

#[tokio::test]
async fn scheduled_event_runs_a_sweep() {
    let controller = controller(
        FakeBackup::with_instances(&["i-a", "i-b"]),
        FakeRestore::default(),
    );

    let response = controller
        .handle(&json!({"detail-type": "Scheduled Event"}))
        .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.body,
        "Created 2 AMI(s) for 2 instance(s): [ami-i-a, ami-i-b]"
    );
}

#[tokio::test]
async fn running_state_change_runs_a_sweep() {
    let controller = controller(
        FakeBackup::with_instances(&["i-a"]),
        FakeRestore::default(),
    );

    let response = controller
        .handle(&json!({
            "detail-type": "EC2 Instance State-change Notification",
            "detail": {"instance-id": "i-a", "state": "running"}
        }))
        .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "Created 1 AMI(s) for 1 instance(s): [ami-i-a]");
}

#[tokio::test]
async fn no_eligible_instances_is_a_success_noop() {
    let controller = controller(FakeBackup::default(), FakeRestore::default());

    let response = controller
        .handle(&json!({"detail-type": "Scheduled Event"}))
        .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "No instances to snapshot.");
}

#[tokio::test]
async fn sweep_surfaces_partial_failures() {
    let backup = FakeBackup {
        fail_create_for: vec!["i-a".to_string()],
        ..FakeBackup::with_instances(&["i-a", "i-b"])
    };
    let controller = controller(backup, FakeRestore::default());

    let response = controller
        .handle(&json!({"detail-type": "Scheduled Event"}))
        .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.body,
        "Created 1 AMI(s) for 2 instance(s): [ami-i-b]; failed for: [i-a]"
    );
}

#[tokio::test]
async fn terminated_instance_is_restored() {
    let restore = FakeRestore {
        images: vec![
            backup_image("ami-old", "2024-01-01T00:00:00.000Z"),
            backup_image("ami-new", "2024-06-01T00:00:00.000Z"),
        ],
        ..Default::default()
    };
    let controller = controller(FakeBackup::default(), restore);

    let response = controller
        .handle(&json!({
            "detail-type": "EC2 Instance State-change Notification",
            "detail": {"instance-id": "i-dead", "state": "terminated"}
        }))
        .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.body,
        "Restored instance i-replacement from AMI ami-new"
    );
}

#[tokio::test]
async fn duplicate_termination_notification_is_skipped() {
    let restore = FakeRestore {
        images: vec![backup_image("ami-1", "2024-01-01T00:00:00.000Z")],
        ..Default::default()
    };
    let controller = controller(FakeBackup::default(), restore);

    let event = json!({
        "detail-type": "EC2 Instance State-change Notification",
        "detail": {"instance-id": "i-dead", "state": "terminated"}
    });

    let first = controller.handle(&event).await;
    assert_eq!(first.status_code, 200);
    assert_eq!(first.body, "Restored instance i-replacement from AMI ami-1");

    let second = controller.handle(&event).await;
    assert_eq!(second.status_code, 200);
    assert_eq!(
        second.body,
        "Instance(s) [\"i-replacement\"] already running. No new instance launched."
    );
}

#[tokio::test]
async fn no_backup_is_a_500() {
    let controller = controller(FakeBackup::default(), FakeRestore::default());

    let response = controller
        .handle(&json!({
            "detail-type": "EC2 Instance State-change Notification",
            "detail": {"instance-id": "i-dead", "state": "terminated"}
        }))
        .await;

    assert_eq!(response.status_code, 500);
    assert_eq!(
        response.body,
        "Error: no backup image found for instance i-dead"
    );
}

#[tokio::test]
async fn unhandled_state_is_a_200_noop() {
    let controller = controller(FakeBackup::default(), FakeRestore::default());

    let response = controller
        .handle(&json!({
            "detail-type": "EC2 Instance State-change Notification",
            "detail": {"instance-id": "i-a", "state": "stopping"}
        }))
        .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "Ignoring state: stopping");
}

#[tokio::test]
async fn unknown_event_type_is_a_200_noop() {
    let controller = controller(FakeBackup::default(), FakeRestore::default());

    let response = controller
        .handle(&json!({"detail-type": "S3 Object Created"}))
        .await;

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "Unknown event type: S3 Object Created");

    let response = controller.handle(&json!({})).await;
    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, "Unknown event type: <none>");
}

#[tokio::test]
async fn malformed_state_change_is_a_500() {
    let controller = controller(FakeBackup::default(), FakeRestore::default());

    let response = controller
        .handle(&json!({
            "detail-type": "EC2 Instance State-change Notification",
            "detail": {"state": "terminated"}
        }))
        .await;

    assert_eq!(response.status_code, 500);
    assert_eq!(
        response.body,
        "Error: malformed state-change event: missing instance-id in event detail"
    );
}
