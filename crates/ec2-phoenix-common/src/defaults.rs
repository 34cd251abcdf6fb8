//! Default configuration values for the controller
//!
//! These constants keep the controller binary and the integration tests in
//! agreement about fallback behavior.

/// Default AWS region when none is configured
pub const DEFAULT_REGION: &str = "us-east-2";

/// Default instance type for restored instances
pub const DEFAULT_INSTANCE_TYPE: &str = "t3.micro";

/// Default Name tag applied to restored instances
pub const DEFAULT_TAG_NAME: &str = "ec2-snapshot";

/// Default number of image polling attempts (~5 minutes at 10s spacing)
pub const POLL_MAX_ATTEMPTS: u32 = 30;

/// Default spacing between image polling attempts, in seconds
pub const POLL_DELAY_SECS: u64 = 10;

/// SSM parameter resolving the current Amazon Linux 2 base image
pub const BASE_IMAGE_PARAMETER: &str =
    "/aws/service/ami-amazon-linux-latest/amzn2-ami-hvm-x86_64-gp2";

/// Fallback base image when the SSM lookup fails
pub const FALLBACK_BASE_IMAGE: &str = "ami-08e3ff0dfac458a93";
