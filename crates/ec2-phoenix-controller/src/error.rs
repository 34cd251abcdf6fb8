//! Typed controller errors
//!
//! The error categories the response shaper and operators care about.
//! Provider query failures stay as contextual [`anyhow::Error`]s raised by
//! the gateways; everything here is wrapped in anyhow at the use site and
//! surfaced through the 500 response path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuardError {
    /// No available backup image exists for the terminated instance.
    #[error("no backup image found for instance {instance_id}")]
    NoBackupFound { instance_id: String },

    /// The image never reached a terminal state within the polling budget.
    #[error("image {image_id} did not reach a terminal state after {attempts} attempts")]
    PollTimeout { image_id: String, attempts: u32 },

    /// The image reached a failed terminal state.
    #[error("image {image_id} entered a failed state")]
    ImageFailed { image_id: String },
}
