//! `bouncer batch-canary` — kill old nodes in batches of a fixed size,
//! never decrementing capacity, so the ASG replaces each batch on its own.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;

use bouncer_controller::{AwsCloudClient, CancelSignal, CloudClient, Controller, RotationOutcome};

use super::common::CommonArgs;
use super::Cli;

/// Arguments for `bouncer batch-canary`.
#[derive(Args, Debug)]
pub struct BatchCanaryArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Number of old instances to kill per batch.
    #[arg(short = 'b', long = "batchsize")]
    pub batch_size: i32,
}

/// Runs the batch-canary subcommand end to end.
///
/// Batch-canary briefly exceeds target capacity while a batch settles, so
/// every `--asgs` entry must spell out `NAME:CAPACITY` explicitly; the Go
/// tool's undocumented "`0` means unbounded" default isn't replicated here,
/// a positive `--batchsize` is required instead (see DESIGN.md).
pub async fn run(cli: &Cli, args: &BatchCanaryArgs, cancel: CancelSignal) -> Result<()> {
    if args.batch_size <= 0 {
        bail!("--batchsize must be a positive integer, got {}", args.batch_size);
    }

    let asgs = args
        .common
        .parse_desired_asgs(None)
        .context("error parsing ASG list")?;
    let client: Arc<dyn CloudClient> = Arc::new(AwsCloudClient::from_env().await);
    let mut controller = Controller::with_cancel(client, args.common.controller_options(cli), asgs, Some(cancel));

    match bouncer_controller::modes::batch_canary::run(&mut controller, args.batch_size)
        .await
        .context("batch-canary rotation failed")?
    {
        RotationOutcome::Done => tracing::info!("batch-canary rotation complete"),
        RotationOutcome::Noop => tracing::info!("noop stopped the rotation"),
    }
    Ok(())
}
