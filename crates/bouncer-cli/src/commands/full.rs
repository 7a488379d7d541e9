//! `bouncer full` — shrink every old instance out and then regrow to
//! target, the most disruptive mode and the one with no headroom
//! requirement.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use bouncer_controller::{AwsCloudClient, CancelSignal, CloudClient, Controller, RotationOutcome};

use super::common::CommonArgs;
use super::Cli;

/// Full mode decrements capacity as it kills, so a bare `NAME` defaults to
/// one: the group is driven back up to target regardless.
const DEFAULT_CAPACITY: i32 = 1;

/// Arguments for `bouncer full`.
#[derive(Args, Debug)]
pub struct FullArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Runs the full subcommand end to end.
pub async fn run(cli: &Cli, args: &FullArgs, cancel: CancelSignal) -> Result<()> {
    let asgs = args
        .common
        .parse_desired_asgs(Some(DEFAULT_CAPACITY))
        .context("error parsing ASG list")?;
    let client: Arc<dyn CloudClient> = Arc::new(AwsCloudClient::from_env().await);
    let mut controller = Controller::with_cancel(client, args.common.controller_options(cli), asgs, Some(cancel));

    match bouncer_controller::modes::full::run(&mut controller)
        .await
        .context("full rotation failed")?
    {
        RotationOutcome::Done => tracing::info!("full rotation complete"),
        RotationOutcome::Noop => tracing::info!("noop stopped the rotation"),
    }
    Ok(())
}
