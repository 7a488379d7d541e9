//! `bouncer rolling` — bounce old instances one at a time, letting the
//! ASG's own replacement policy launch each replacement.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use bouncer_controller::{AwsCloudClient, CancelSignal, CloudClient, Controller, RotationOutcome};

use super::common::CommonArgs;
use super::Cli;

/// Rolling never changes a group's desired capacity, so a bare `NAME` on
/// `--asgs` is unambiguous; the value itself is irrelevant to the decider.
const DEFAULT_CAPACITY: i32 = 1;

/// Arguments for `bouncer rolling`.
#[derive(Args, Debug)]
pub struct RollingArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Runs the rolling subcommand end to end.
pub async fn run(cli: &Cli, args: &RollingArgs, cancel: CancelSignal) -> Result<()> {
    let asgs = args
        .common
        .parse_desired_asgs(Some(DEFAULT_CAPACITY))
        .context("error parsing ASG list")?;
    let client: Arc<dyn CloudClient> = Arc::new(AwsCloudClient::from_env().await);
    let mut controller = Controller::with_cancel(client, args.common.controller_options(cli), asgs, Some(cancel));

    match bouncer_controller::modes::rolling::run(&mut controller)
        .await
        .context("rolling rotation failed")?
    {
        RotationOutcome::Done => tracing::info!("rolling rotation complete"),
        RotationOutcome::Noop => tracing::info!("noop stopped the rotation"),
    }
    Ok(())
}
