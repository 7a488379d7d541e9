//! `bouncer` — command-line front end for the fleet rotation controller.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

/// Set (to any non-empty value) to skip every action and exit with success,
/// regardless of subcommand. Checked before any cloud client is built.
const KILLSWITCH_VAR: &str = "BOUNCER_KILLSWITCH";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "bouncer=debug" } else { "bouncer=info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if std::env::var(KILLSWITCH_VAR).is_ok_and(|v| !v.is_empty()) {
        tracing::warn!("{KILLSWITCH_VAR} is set, skipping all actions and exiting with success");
        return Ok(());
    }

    let cancel = bouncer_controller::spawn_cancellation_listener();

    let result = match &cli.command {
        Commands::Rolling(args) => commands::rolling::run(&cli, args, cancel).await,
        Commands::Full(args) => commands::full::run(&cli, args, cancel).await,
        Commands::Serial(args) => commands::serial::run(&cli, args, cancel).await,
        Commands::Canary(args) => commands::canary::run(&cli, args, cancel).await,
        Commands::SlowCanary(args) => commands::slow_canary::run(&cli, args, cancel).await,
        Commands::BatchCanary(args) => commands::batch_canary::run(&cli, args, cancel).await,
        Commands::BatchSerial(args) => commands::batch_serial::run(&cli, args, cancel).await,
    };

    if let Err(err) = result {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }

    Ok(())
}
