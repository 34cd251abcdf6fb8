//! Invocation response shaping
//!
//! The only user-visible contract of an invocation: every handled outcome,
//! including expected no-ops, maps to status 200 with a human-readable
//! message; unexpected errors map to status 500. Callers treat a non-200
//! status as requiring operational attention.

use serde::{Deserialize, Serialize};

/// Status for handled outcomes, including no-ops
pub const STATUS_OK: u16 = 200;

/// Status for unexpected errors
pub const STATUS_ERROR: u16 = 500;

/// Response returned for every invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl InvocationResponse {
    /// A handled outcome (success or expected no-op)
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_OK,
            body: body.into(),
        }
    }

    /// An unexpected error
    pub fn error(body: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_ERROR,
            body: body.into(),
        }
    }

    /// Whether this response reports a handled outcome
    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }
}
