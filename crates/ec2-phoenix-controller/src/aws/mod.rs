//! AWS gateway modules
//!
//! Thin wrappers around the AWS SDK clients this controller consumes:
//! - EC2 (backup side): eligible-instance discovery, image creation
//! - EC2 (restore side): guard queries, backup lookup, instance launch
//! - SSM: base-image parameter lookup

pub mod backup;
pub mod context;
pub mod error;
pub mod restore;
pub mod ssm;

// Core clients
pub use backup::{BackupClient, BackupOperations, ImageState};
pub use context::AwsContext;
pub use restore::{BackupImage, LaunchSpec, RestoreClient, RestoreOperations};
pub use ssm::SsmClient;

// Error handling
pub use error::{classify_aws_error, classify_sdk_error, AwsError};
