//! Flags shared by every rotation subcommand.

use std::time::Duration;

use anyhow::Result;
use clap::Args;

use bouncer_controller::ControllerOptions;

use super::Cli;

/// Flags every rotation mode accepts, mirroring the Go tool's per-command
/// flag set (`-n`, `-f`, `-a`, `-p`).
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Print what would happen without calling the cloud.
    #[arg(short = 'n', long)]
    pub noop: bool,

    /// Also recycle instances that match the ASG's current launch spec.
    #[arg(short = 'f', long)]
    pub force: bool,

    /// Comma-separated ASGs to rotate: `NAME` or `NAME:CAPACITY`.
    #[arg(short = 'a', long = "asgs", alias = "asg")]
    pub asgs: String,

    /// Comma-separated pre-terminate commands, one per entry in `--asgs`.
    #[arg(short = 'p', long = "preterminatecall")]
    pub pre_terminate_call: Option<String>,
}

impl CommonArgs {
    /// Parses `--asgs`/`--preterminatecall` into the operator's desired
    /// state, filling in `default_capacity` for entries that omit it.
    pub fn parse_desired_asgs(&self, default_capacity: Option<i32>) -> Result<Vec<bouncer_core::DesiredAsg>> {
        let calls: Vec<String> = match &self.pre_terminate_call {
            Some(s) if !s.is_empty() => s.split(',').map(|part| part.trim().to_string()).collect(),
            _ => Vec::new(),
        };
        Ok(bouncer_core::parse_asg_list(&self.asgs, default_capacity, &calls)?)
    }

    /// Builds the options a [`bouncer_controller::Controller`] needs from
    /// these mode-level flags plus the global CLI flags.
    #[must_use]
    pub fn controller_options(&self, cli: &Cli) -> ControllerOptions {
        ControllerOptions {
            noop: self.noop,
            force: self.force,
            item_timeout: Duration::from_secs(cli.timeout.max(1) * 60),
            terminate_hook: cli.terminate_hook.clone(),
            pending_hook: cli.pending_hook.clone(),
        }
    }
}
