//! Inbound event parsing
//!
//! Events arrive as JSON envelopes from the periodic scheduler or from EC2
//! instance state-change notifications. They are parsed here, at the
//! boundary, into a closed [`Event`] union so the rest of the controller
//! never touches stringly-typed fields. A state-change envelope missing its
//! instance id or state is rejected through a single [`EventError`] path;
//! every other unrecognized shape parses to [`Event::Unknown`] and is handled
//! as a no-op downstream.

use serde_json::Value;
use thiserror::Error;

/// `detail-type` value for the periodic scheduler tick
pub const DETAIL_TYPE_SCHEDULED: &str = "Scheduled Event";

/// `detail-type` value for instance state-change notifications
pub const DETAIL_TYPE_STATE_CHANGE: &str = "EC2 Instance State-change Notification";

/// Error raised for a state-change event missing required fields
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("malformed state-change event: missing {0} in event detail")]
    MissingField(&'static str),
}

/// EC2 instance lifecycle state as carried on the wire.
///
/// `Other` carries states this controller has no handling for, so they can
/// be classified as ignorable instead of failing the invocation.
#[derive(Debug, Clone, PartialEq, Eq, strum::EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Stopping,
    Stopped,
    Terminated,
    #[strum(default)]
    Other(String),
}

impl InstanceState {
    /// Parse from the wire string; unknown states become [`InstanceState::Other`].
    pub fn parse(s: &str) -> Self {
        s.parse().unwrap_or_else(|_| Self::Other(s.to_string()))
    }
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::ShuttingDown => "shutting-down",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Terminated => "terminated",
            Self::Other(other) => other.as_str(),
        };
        f.write_str(s)
    }
}

/// Inbound event, parsed into a closed union
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Periodic scheduler tick
    Scheduled,
    /// EC2 instance state-change notification
    StateChange {
        instance_id: String,
        state: InstanceState,
    },
    /// Anything this controller does not recognize
    Unknown { detail_type: Option<String> },
}

impl Event {
    /// Parse a raw JSON event envelope.
    ///
    /// Only a state-change envelope with a missing or empty `instance-id` or
    /// `state` is an error; unrecognized shapes parse to [`Event::Unknown`].
    pub fn from_value(value: &Value) -> Result<Self, EventError> {
        let detail_type = value.get("detail-type").and_then(Value::as_str);

        match detail_type {
            Some(DETAIL_TYPE_SCHEDULED) => Ok(Event::Scheduled),
            Some(DETAIL_TYPE_STATE_CHANGE) => {
                let detail = value.get("detail");
                let instance_id = detail
                    .and_then(|d| d.get("instance-id"))
                    .and_then(Value::as_str)
                    .filter(|id| !id.is_empty())
                    .ok_or(EventError::MissingField("instance-id"))?;
                let state = detail
                    .and_then(|d| d.get("state"))
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .ok_or(EventError::MissingField("state"))?;

                Ok(Event::StateChange {
                    instance_id: instance_id.to_string(),
                    state: InstanceState::parse(state),
                })
            }
            other => Ok(Event::Unknown {
                detail_type: other.map(str::to_string),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scheduled_event() {
        let event = Event::from_value(&json!({"detail-type": "Scheduled Event"})).unwrap();
        assert_eq!(event, Event::Scheduled);
    }

    #[test]
    fn scheduled_event_ignores_extra_fields() {
        let event = Event::from_value(&json!({
            "detail-type": "Scheduled Event",
            "detail": {"instance-id": "i-123", "state": "running"}
        }))
        .unwrap();
        assert_eq!(event, Event::Scheduled);
    }

    #[test]
    fn state_change_event() {
        let event = Event::from_value(&json!({
            "detail-type": "EC2 Instance State-change Notification",
            "detail": {"instance-id": "i-0abc", "state": "terminated"}
        }))
        .unwrap();
        assert_eq!(
            event,
            Event::StateChange {
                instance_id: "i-0abc".to_string(),
                state: InstanceState::Terminated,
            }
        );
    }

    #[test]
    fn state_change_missing_instance_id() {
        let err = Event::from_value(&json!({
            "detail-type": "EC2 Instance State-change Notification",
            "detail": {"state": "terminated"}
        }))
        .unwrap_err();
        assert_eq!(err, EventError::MissingField("instance-id"));
    }

    #[test]
    fn state_change_missing_state() {
        let err = Event::from_value(&json!({
            "detail-type": "EC2 Instance State-change Notification",
            "detail": {"instance-id": "i-0abc"}
        }))
        .unwrap_err();
        assert_eq!(err, EventError::MissingField("state"));
    }

    #[test]
    fn state_change_missing_detail() {
        let err = Event::from_value(&json!({
            "detail-type": "EC2 Instance State-change Notification"
        }))
        .unwrap_err();
        assert_eq!(err, EventError::MissingField("instance-id"));
    }

    #[test]
    fn state_change_empty_fields_are_missing() {
        let err = Event::from_value(&json!({
            "detail-type": "EC2 Instance State-change Notification",
            "detail": {"instance-id": "", "state": "running"}
        }))
        .unwrap_err();
        assert_eq!(err, EventError::MissingField("instance-id"));
    }

    #[test]
    fn unknown_detail_type() {
        let event = Event::from_value(&json!({"detail-type": "S3 Object Created"})).unwrap();
        assert_eq!(
            event,
            Event::Unknown {
                detail_type: Some("S3 Object Created".to_string())
            }
        );
    }

    #[test]
    fn arbitrary_shapes_never_error() {
        for value in [json!({}), json!(42), json!("tick"), json!(null), json!([1, 2])] {
            let event = Event::from_value(&value).unwrap();
            assert_eq!(event, Event::Unknown { detail_type: None });
        }
    }

    #[test]
    fn instance_state_wire_values() {
        assert_eq!(InstanceState::parse("running"), InstanceState::Running);
        assert_eq!(InstanceState::parse("terminated"), InstanceState::Terminated);
        assert_eq!(
            InstanceState::parse("shutting-down"),
            InstanceState::ShuttingDown
        );
        assert_eq!(
            InstanceState::parse("rebooting"),
            InstanceState::Other("rebooting".to_string())
        );
    }

    #[test]
    fn instance_state_display_roundtrip() {
        for wire in ["pending", "running", "shutting-down", "stopping", "stopped", "terminated"] {
            assert_eq!(InstanceState::parse(wire).to_string(), wire);
        }
        assert_eq!(InstanceState::parse("weird").to_string(), "weird");
    }
}
