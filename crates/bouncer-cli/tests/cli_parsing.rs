//! Argument-parsing tests for the `bouncer` CLI surface: global flags,
//! per-mode flags, and the `--asgs`/`--preterminatecall` flattening into
//! `bouncer_core::DesiredAsg`.

use clap::Parser;

#[path = "../src/commands/mod.rs"]
mod commands;

use commands::{Cli, Commands};

#[test]
fn rolling_accepts_a_bare_asg_name() {
    let cli = Cli::try_parse_from(["bouncer", "rolling", "-a", "svc-a"]).unwrap();
    match cli.command {
        Commands::Rolling(args) => assert_eq!(args.common.asgs, "svc-a"),
        other => panic!("expected Rolling, got {other:?}"),
    }
}

#[test]
fn asg_alias_is_accepted_alongside_asgs() {
    let cli = Cli::try_parse_from(["bouncer", "rolling", "--asg", "svc-a"]).unwrap();
    match cli.command {
        Commands::Rolling(args) => assert_eq!(args.common.asgs, "svc-a"),
        other => panic!("expected Rolling, got {other:?}"),
    }
}

#[test]
fn global_flags_apply_regardless_of_subcommand_position() {
    let cli = Cli::try_parse_from(["bouncer", "-v", "-t", "5", "rolling", "-a", "svc-a"]).unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.timeout, 5);
    assert_eq!(cli.terminate_hook, "terminate-hook");
    assert_eq!(cli.pending_hook, "pending-hook");
}

#[test]
fn timeout_defaults_to_twenty_minutes() {
    let cli = Cli::try_parse_from(["bouncer", "rolling", "-a", "svc-a"]).unwrap();
    assert_eq!(cli.timeout, 20);
}

#[test]
fn custom_hook_names_are_parsed() {
    let cli = Cli::try_parse_from([
        "bouncer",
        "--terminate-hook",
        "custom-terminate",
        "--pending-hook",
        "custom-pending",
        "rolling",
        "-a",
        "svc-a",
    ])
    .unwrap();
    assert_eq!(cli.terminate_hook, "custom-terminate");
    assert_eq!(cli.pending_hook, "custom-pending");
}

#[test]
fn noop_and_force_flags_are_parsed() {
    let cli = Cli::try_parse_from(["bouncer", "rolling", "-n", "-f", "-a", "svc-a"]).unwrap();
    match cli.command {
        Commands::Rolling(args) => {
            assert!(args.common.noop);
            assert!(args.common.force);
        }
        other => panic!("expected Rolling, got {other:?}"),
    }
}

#[test]
fn pre_terminate_call_flag_is_parsed() {
    let cli = Cli::try_parse_from([
        "bouncer",
        "rolling",
        "-a",
        "svc-a,svc-b",
        "-p",
        "echo one,echo two",
    ])
    .unwrap();
    match cli.command {
        Commands::Rolling(args) => {
            assert_eq!(args.common.pre_terminate_call.as_deref(), Some("echo one,echo two"));
        }
        other => panic!("expected Rolling, got {other:?}"),
    }
}

#[test]
fn batch_canary_requires_batchsize() {
    let err = Cli::try_parse_from(["bouncer", "batch-canary", "-a", "svc-a:3"]).unwrap_err();
    assert!(err.to_string().contains("batchsize"));
}

#[test]
fn batch_canary_parses_given_batchsize() {
    let cli = Cli::try_parse_from(["bouncer", "batch-canary", "-a", "svc-a:3", "-b", "2"]).unwrap();
    match cli.command {
        Commands::BatchCanary(args) => assert_eq!(args.batch_size, 2),
        other => panic!("expected BatchCanary, got {other:?}"),
    }
}

#[test]
fn batch_serial_defaults_batchsize_to_one() {
    let cli = Cli::try_parse_from(["bouncer", "batch-serial", "-a", "svc-a"]).unwrap();
    match cli.command {
        Commands::BatchSerial(args) => assert_eq!(args.batch_size, 1),
        other => panic!("expected BatchSerial, got {other:?}"),
    }
}

#[test]
fn rolling_parse_desired_asgs_defaults_missing_capacity_to_one() {
    let cli = Cli::try_parse_from(["bouncer", "rolling", "-a", "svc-a"]).unwrap();
    match cli.command {
        Commands::Rolling(args) => {
            let desired = args.common.parse_desired_asgs(Some(1)).unwrap();
            assert_eq!(desired.len(), 1);
            assert_eq!(desired[0].name, "svc-a");
            assert_eq!(desired[0].final_desired_capacity, 1);
        }
        other => panic!("expected Rolling, got {other:?}"),
    }
}

#[test]
fn canary_parse_desired_asgs_requires_explicit_capacity() {
    let cli = Cli::try_parse_from(["bouncer", "canary", "-a", "svc-a"]).unwrap();
    match cli.command {
        Commands::Canary(args) => {
            assert!(args.common.parse_desired_asgs(None).is_err());
        }
        other => panic!("expected Canary, got {other:?}"),
    }
}

#[test]
fn missing_asgs_flag_is_a_parse_error() {
    let err = Cli::try_parse_from(["bouncer", "rolling"]).unwrap_err();
    assert!(err.to_string().contains("asgs"));
}
