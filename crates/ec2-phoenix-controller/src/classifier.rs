//! Event classification
//!
//! Pure dispatch: an inbound [`Event`] maps to exactly one [`Action`]. No
//! side effects here; the handler executes whatever this returns.

use ec2_phoenix_common::{Event, InstanceState};

/// What the controller should do with an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Back up every eligible instance
    SnapshotSweep,
    /// Restore the terminated instance from its most recent backup
    Restore { instance_id: String },
    /// Nothing to do; the reason becomes the response body
    Ignore { reason: String },
}

/// Map an event to the action the controller should take.
pub fn classify(event: &Event) -> Action {
    match event {
        Event::Scheduled => Action::SnapshotSweep,
        Event::StateChange {
            state: InstanceState::Running,
            ..
        } => Action::SnapshotSweep,
        Event::StateChange {
            instance_id,
            state: InstanceState::Terminated,
        } => Action::Restore {
            instance_id: instance_id.clone(),
        },
        Event::StateChange { state, .. } => Action::Ignore {
            reason: format!("Ignoring state: {state}"),
        },
        Event::Unknown { detail_type } => Action::Ignore {
            reason: format!(
                "Unknown event type: {}",
                detail_type.as_deref().unwrap_or("<none>")
            ),
        },
    }
}
