//! Reconciliation policies
//!
//! The decision logic of the controller: the snapshot sweep over all
//! eligible instances, and the idempotency-guarded restore of a terminated
//! instance.

pub mod restore;
pub mod snapshot;

pub use restore::{select_latest, LaunchDefaults, RestoreOutcome, RestorePolicy};
pub use snapshot::{CreatedBackup, SnapshotPolicy, SweepFailure, SweepResult, WaitConfig};
