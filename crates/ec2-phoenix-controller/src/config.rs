//! Environment-based controller configuration

use ec2_phoenix_common::defaults;

/// SSH key pair name for restored instances
pub const ENV_KEY_NAME: &str = "DEFAULT_KEY_NAME";

/// VPC subnet id for restored instances
pub const ENV_SUBNET_ID: &str = "DEFAULT_SUBNET_ID";

/// Comma-separated security group ids for restored instances
pub const ENV_SECURITY_GROUPS: &str = "DEFAULT_SECURITY_GROUPS";

/// Instance type for restored instances
pub const ENV_INSTANCE_TYPE: &str = "DEFAULT_INSTANCE_TYPE";

/// Name tag applied to restored instances
pub const ENV_TAG_NAME: &str = "DEFAULT_TAG_NAME";

/// VPC scope for the restore idempotency guard
pub const ENV_VPC_ID: &str = "DEFAULT_VPC_ID";

/// Controller configuration, read from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// AWS region
    pub region: String,

    /// SSH key pair name for restored instances
    pub key_name: Option<String>,

    /// VPC subnet for restored instances
    pub subnet_id: Option<String>,

    /// Security groups for restored instances
    pub security_group_ids: Vec<String>,

    /// Instance type for restored instances
    pub instance_type: String,

    /// Name tag applied to restored instances
    pub tag_name: String,

    /// VPC scope for the idempotency guard; unset means the whole region
    pub vpc_id: Option<String>,
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            region: lookup("AWS_REGION")
                .or_else(|| lookup("AWS_DEFAULT_REGION"))
                .unwrap_or_else(|| defaults::DEFAULT_REGION.to_string()),
            key_name: lookup(ENV_KEY_NAME),
            subnet_id: lookup(ENV_SUBNET_ID),
            security_group_ids: lookup(ENV_SECURITY_GROUPS)
                .map(|raw| split_security_groups(&raw))
                .unwrap_or_default(),
            instance_type: lookup(ENV_INSTANCE_TYPE)
                .unwrap_or_else(|| defaults::DEFAULT_INSTANCE_TYPE.to_string()),
            tag_name: lookup(ENV_TAG_NAME)
                .unwrap_or_else(|| defaults::DEFAULT_TAG_NAME.to_string()),
            vpc_id: lookup(ENV_VPC_ID),
        }
    }
}

/// Split the comma-separated security group list, dropping empty segments.
pub fn split_security_groups(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
