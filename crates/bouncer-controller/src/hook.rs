//! Runs an operator-supplied pre-terminate command to completion, streaming
//! its output into the logger and killing it if it overruns the deadline.
//!
//! Grounded on the timeout-then-kill shape of
//! `other_examples/…adaptive_expert_platform-src-lifecycle.rs.rs`'s
//! `command_health_check`, adapted from a one-shot probe to a long-running
//! streamed command.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::error::{ControllerError, Result};

/// Splits a whitespace-delimited command line the way the operator types it
/// on the `--preterminatecall` flag, runs it to completion, and forwards
/// each output line to `tracing` tagged with the argv and stream name.
///
/// Fails if the process cannot be spawned, exits non-zero, or is still
/// running after `timeout` (in which case it is killed before returning).
pub async fn run_pre_terminate_cmd(command_line: &str, timeout: Duration) -> Result<()> {
    let argv: Vec<&str> = command_line.split_whitespace().collect();
    let Some((program, args)) = argv.split_first() else {
        return Err(ControllerError::Hook {
            reason: "pre-terminate command is empty".to_string(),
        });
    };

    let mut child = Command::new(program)
        .args(args)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()
        .map_err(|e| ControllerError::Hook {
            reason: format!("failed to spawn {command_line:?}: {e}"),
        })?;

    let stdout = child.stdout.take().expect("piped stdout");
    let stderr = child.stderr.take().expect("piped stderr");
    let argv_display = command_line.to_string();

    let stdout_argv = argv_display.clone();
    let stdout_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::info!(argv = %stdout_argv, stream = "stdout", "{line}");
        }
    });

    let stderr_argv = argv_display.clone();
    let stderr_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::warn!(argv = %stderr_argv, stream = "stderr", "{line}");
        }
    });

    let wait_result = tokio::time::timeout(timeout, child.wait()).await;

    let status = match wait_result {
        Ok(status) => status.map_err(|e| ControllerError::Hook {
            reason: format!("error waiting for {argv_display:?}: {e}"),
        })?,
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            return Err(ControllerError::Hook {
                reason: format!("{argv_display:?} exceeded timeout of {timeout:?} and was killed"),
            });
        }
    };

    let _ = stdout_task.await;
    let _ = stderr_task.await;

    if !status.success() {
        return Err(ControllerError::Hook {
            reason: format!("{argv_display:?} exited with {status}"),
        });
    }

    Ok(())
}
