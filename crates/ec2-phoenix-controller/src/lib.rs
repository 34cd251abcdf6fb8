//! ec2-phoenix-controller - event-driven EC2 AMI backup/restore controller
//!
//! Keeps exactly one live instance backed by periodic AMI backups, and
//! restores from the most recent backup when the live instance terminates
//! unexpectedly. Each invocation is a short-lived, stateless reconciliation
//! pass; the provider's resource tags and instance state are the only source
//! of truth.

pub mod aws;
pub mod classifier;
pub mod config;
pub mod error;
pub mod handler;
pub mod policy;
