//! `bouncer batch-serial` — kill and regrow old nodes in batches of a
//! fixed size, decrementing capacity on every kill so the ASG never
//! launches a premature replacement mid-batch.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use bouncer_controller::{AwsCloudClient, CancelSignal, CloudClient, Controller, RotationOutcome};

use super::common::CommonArgs;
use super::Cli;

/// A bare `NAME` on `--asgs` defaults to one, matching the Go tool.
const DEFAULT_CAPACITY: i32 = 1;

/// Default batch size, matching the Go tool's `batch-serial` default.
const DEFAULT_BATCH_SIZE: i32 = 1;

/// Arguments for `bouncer batch-serial`.
#[derive(Args, Debug)]
pub struct BatchSerialArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Number of old instances to kill and regrow per batch.
    #[arg(short = 'b', long = "batchsize", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: i32,
}

/// Runs the batch-serial subcommand end to end.
pub async fn run(cli: &Cli, args: &BatchSerialArgs, cancel: CancelSignal) -> Result<()> {
    if args.batch_size <= 0 {
        bail!("--batchsize must be a positive integer, got {}", args.batch_size);
    }

    let asgs = args
        .common
        .parse_desired_asgs(Some(DEFAULT_CAPACITY))
        .context("error parsing ASG list")?;
    let client: Arc<dyn CloudClient> = Arc::new(AwsCloudClient::from_env().await);
    let mut controller = Controller::with_cancel(client, args.common.controller_options(cli), asgs, Some(cancel));

    match bouncer_controller::modes::batch_serial::run(&mut controller, args.batch_size)
        .await
        .context("batch-serial rotation failed")?
    {
        RotationOutcome::Done => tracing::info!("batch-serial rotation complete"),
        RotationOutcome::Noop => tracing::info!("noop stopped the rotation"),
    }
    Ok(())
}
