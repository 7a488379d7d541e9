//! CLI surface: the top-level [`Cli`]/[`Commands`] parsed by `clap`, one
//! module per rotation mode below holding that mode's extra flags and its
//! `run` entry point.
//!
//! Grounded on `original_source/vendor/github.com/palantir/bouncer/cmd/root.go`
//! for the global flags and the killswitch check.

use clap::{Parser, Subcommand};

pub mod batch_canary;
pub mod batch_serial;
pub mod canary;
pub mod common;
pub mod full;
pub mod rolling;
pub mod serial;
pub mod slow_canary;

/// Bounces AWS instances that are due to be cycled in the given ASGs.
#[derive(Parser, Debug)]
#[command(name = "bouncer", version, about, long_about = None)]
pub struct Cli {
    /// Enable debug-level logging.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Timeout for each mutating action, in minutes.
    #[arg(short = 't', long, default_value_t = 20, global = true)]
    pub timeout: u64,

    /// Name of the lifecycle hook on the `EC2_INSTANCE_TERMINATING` transition.
    #[arg(long, default_value = "terminate-hook", env = "BOUNCER_TERMINATE_HOOK", global = true)]
    pub terminate_hook: String,

    /// Name of the lifecycle hook on the `EC2_INSTANCE_LAUNCHING` transition.
    #[arg(long, default_value = "pending-hook", env = "BOUNCER_PENDING_HOOK", global = true)]
    pub pending_hook: String,

    /// The rotation mode to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// One variant per rotation mode.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bounce one old instance at a time, letting the ASG replace it.
    Rolling(rolling::RollingArgs),
    /// Drain every group to zero old instances, then refill: the most
    /// disruptive mode.
    Full(full::FullArgs),
    /// Bounce one old instance at a time: decrement, wait, then regrow.
    Serial(serial::SerialArgs),
    /// Launch one canary node ahead of target, then kill every old node.
    Canary(canary::CanaryArgs),
    /// Grow one canary node ahead of target, kill old nodes one at a time.
    SlowCanary(slow_canary::SlowCanaryArgs),
    /// Kill old nodes in batches, letting the ASG replace each batch.
    BatchCanary(batch_canary::BatchCanaryArgs),
    /// Shrink and regrow old nodes in batches of a fixed size.
    BatchSerial(batch_serial::BatchSerialArgs),
}
