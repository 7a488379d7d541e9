//! `bouncer serial` — bounce old instances one at a time: decrement, wait
//! for the kill to settle, then regrow, before moving to the next.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use bouncer_controller::{AwsCloudClient, CancelSignal, CloudClient, Controller, RotationOutcome};

use super::common::CommonArgs;
use super::Cli;

/// A bare `NAME` on `--asgs` defaults to one, matching the Go tool.
const DEFAULT_CAPACITY: i32 = 1;

/// Arguments for `bouncer serial`.
#[derive(Args, Debug)]
pub struct SerialArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Runs the serial subcommand end to end.
pub async fn run(cli: &Cli, args: &SerialArgs, cancel: CancelSignal) -> Result<()> {
    let asgs = args
        .common
        .parse_desired_asgs(Some(DEFAULT_CAPACITY))
        .context("error parsing ASG list")?;
    let client: Arc<dyn CloudClient> = Arc::new(AwsCloudClient::from_env().await);
    let mut controller = Controller::with_cancel(client, args.common.controller_options(cli), asgs, Some(cancel));

    match bouncer_controller::modes::serial::run(&mut controller)
        .await
        .context("serial rotation failed")?
    {
        RotationOutcome::Done => tracing::info!("serial rotation complete"),
        RotationOutcome::Noop => tracing::info!("noop stopped the rotation"),
    }
    Ok(())
}
