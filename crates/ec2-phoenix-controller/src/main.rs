//! ec2-phoenix: event-driven EC2 AMI backup and restore
//!
//! Handles scheduler ticks and instance state-change notifications, and
//! exposes the underlying policies directly for operators.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ec2_phoenix_controller::aws::{AwsContext, BackupClient, RestoreClient, SsmClient};
use ec2_phoenix_controller::config::Config;
use ec2_phoenix_controller::handler::{sweep_message, Controller};
use ec2_phoenix_controller::policy::{
    LaunchDefaults, RestoreOutcome, RestorePolicy, SnapshotPolicy,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ec2-phoenix")]
#[command(about = "Event-driven EC2 AMI backup and restore")]
#[command(version)]
struct Args {
    /// AWS region (defaults to AWS_REGION / AWS_DEFAULT_REGION)
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Handle one event envelope and print the response
    Handle {
        /// Path to the event JSON; reads stdin when omitted
        #[arg(short, long)]
        event: Option<PathBuf>,
    },

    /// Run the snapshot sweep over all eligible instances
    Sweep {
        /// Wait for each created image to become available
        #[arg(long)]
        wait: bool,
    },

    /// Restore a terminated instance from its most recent backup
    Restore {
        /// Terminated instance id to restore
        #[arg(long)]
        instance_id: String,
    },

    /// Resolve the stock base image id via SSM
    ResolveBaseImage,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::from_env();
    if let Some(region) = args.region {
        config.region = region;
    }

    match args.command {
        Command::Handle { event } => {
            let raw = read_event(event.as_deref())?;
            let controller = Controller::connect(&config).await?;
            let response = controller.handle(&raw).await;

            println!("{}", serde_json::to_string(&response)?);

            if !response.is_success() {
                std::process::exit(1);
            }
        }

        Command::Sweep { wait } => {
            let ctx = AwsContext::new(&config.region).await;
            let policy =
                SnapshotPolicy::new(BackupClient::from_context(&ctx)).with_verify_available(wait);

            let result = policy.run_sweep().await?;
            info!(
                attempted = result.attempted.len(),
                succeeded = result.succeeded.len(),
                failed = result.failed.len(),
                "Sweep finished"
            );
            println!("{}", sweep_message(&result));
        }

        Command::Restore { instance_id } => {
            let ctx = AwsContext::new(&config.region).await;
            let policy = RestorePolicy::new(
                RestoreClient::from_context(&ctx, config.vpc_id.clone()),
                LaunchDefaults::from_config(&config),
            );

            match policy.run_restore(&instance_id).await? {
                RestoreOutcome::Launched {
                    instance_id,
                    image_id,
                } => {
                    println!("Restored instance {instance_id} from AMI {image_id}");
                }
                RestoreOutcome::Skipped {
                    active_instance_ids,
                } => {
                    println!(
                        "Instance(s) {active_instance_ids:?} already running. No new instance launched."
                    );
                }
            }
        }

        Command::ResolveBaseImage => {
            let ctx = AwsContext::new(&config.region).await;
            let ssm = SsmClient::from_context(&ctx);
            println!("{}", ssm.resolve_base_image().await);
        }
    }

    Ok(())
}

fn read_event(path: Option<&Path>) -> Result<serde_json::Value> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event from {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::Read::read_to_string(&mut std::io::stdin(), &mut buffer)
                .context("Failed to read event from stdin")?;
            buffer
        }
    };

    serde_json::from_str(&raw).context("Event is not valid JSON")
}
