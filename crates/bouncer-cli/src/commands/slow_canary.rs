//! `bouncer slow-canary` — grow by one canary node ahead of target, then
//! kill old nodes one at a time, staying near `target + 1` instead of
//! canary mode's full double-capacity peak.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use bouncer_controller::{AwsCloudClient, CancelSignal, CloudClient, Controller, RotationOutcome};

use super::common::CommonArgs;
use super::Cli;

/// Arguments for `bouncer slow-canary`.
#[derive(Args, Debug)]
pub struct SlowCanaryArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

/// Runs the slow-canary subcommand end to end.
///
/// Like canary, capacity briefly exceeds target by one, so every `--asgs`
/// entry must spell out `NAME:CAPACITY` explicitly.
pub async fn run(cli: &Cli, args: &SlowCanaryArgs, cancel: CancelSignal) -> Result<()> {
    let asgs = args
        .common
        .parse_desired_asgs(None)
        .context("error parsing ASG list")?;
    let client: Arc<dyn CloudClient> = Arc::new(AwsCloudClient::from_env().await);
    let mut controller = Controller::with_cancel(client, args.common.controller_options(cli), asgs, Some(cancel));

    match bouncer_controller::modes::slow_canary::run(&mut controller)
        .await
        .context("slow-canary rotation failed")?
    {
        RotationOutcome::Done => tracing::info!("slow-canary rotation complete"),
        RotationOutcome::Noop => tracing::info!("noop stopped the rotation"),
    }
    Ok(())
}
