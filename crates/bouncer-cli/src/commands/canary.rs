//! `bouncer canary` — launch one canary node ahead of target, then kill
//! every old node at once once the canary is healthy.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use bouncer_controller::{AwsCloudClient, CancelSignal, CloudClient, Controller, RotationOutcome};

use super::common::CommonArgs;
use super::Cli;

/// Arguments for `bouncer canary`.
#[derive(Args, Debug)]
pub struct CanaryArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Runs the canary subcommand end to end.
///
/// Canary doubles capacity at its peak, so every `--asgs` entry must spell
/// out `NAME:CAPACITY` explicitly; there is no sane default to fall back to.
pub async fn run(cli: &Cli, args: &CanaryArgs, cancel: CancelSignal) -> Result<()> {
    let asgs = args
        .common
        .parse_desired_asgs(None)
        .context("error parsing ASG list")?;
    let client: Arc<dyn CloudClient> = Arc::new(AwsCloudClient::from_env().await);
    let mut controller = Controller::with_cancel(client, args.common.controller_options(cli), asgs, Some(cancel));

    match bouncer_controller::modes::canary::run(&mut controller)
        .await
        .context("canary rotation failed")?
    {
        RotationOutcome::Done => tracing::info!("canary rotation complete"),
        RotationOutcome::Noop => tracing::info!("noop stopped the rotation"),
    }
    Ok(())
}
