//! The actions every mode decider shares: killing an instance, growing
//! desired capacity, sleeping between polls, the noop gate, and rebuilding a
//! fresh snapshot. Grounded on `original_source/bouncer/runner.go`'s
//! `BaseRunner`, composed into each mode runner there by embedding; here the
//! composition is explicit, per spec.md §9's design note.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::Instant;

use bouncer_core::{AsgSet, DesiredAsg, InstanceSnapshot, LifecycleState};

use crate::cloud::{CloudClient, LifecycleActionResult};
use crate::error::{ControllerError, Result};
use crate::hook::run_pre_terminate_cmd;
use crate::snapshot::build_asg_set;

/// A cheaply-cloneable cancellation signal: `true` once the operator has
/// asked the run to stop (SIGINT/SIGTERM). Every suspension point in the
/// controller races against it.
pub type CancelSignal = watch::Receiver<bool>;

/// Spawns a listener for Ctrl-C (and, on Unix, `SIGTERM`) and returns a
/// [`CancelSignal`] that flips to `true` the moment either arrives.
///
/// Grounded on `eunomia-distributor`'s `run_until_shutdown`, which awaits
/// `tokio::signal::ctrl_c()` to trigger a graceful shutdown; here the signal
/// is broadcast to every suspension point in the run rather than a single
/// shutdown future, since the controller has many `await` points instead of
/// one top-level server future.
#[must_use]
pub fn spawn_cancellation_listener() -> CancelSignal {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut term = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(term) => term,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGTERM handler");
                    let _ = tokio::signal::ctrl_c().await;
                    let _ = tx.send(true);
                    return;
                }
            };
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        tracing::warn!("interrupt received, cancelling rotation");
        let _ = tx.send(true);
    });
    rx
}

/// Fixed sleep between poll ticks.
pub const WAIT_BETWEEN_CHECKS: Duration = Duration::from_secs(15);

/// Default per-action deadline, reset before every mutating call.
pub const DEFAULT_ITEM_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// Default lifecycle hook names.
pub const DEFAULT_TERMINATE_HOOK: &str = "terminate-hook";
/// Default pending-hook name.
pub const DEFAULT_PENDING_HOOK: &str = "pending-hook";

/// Options shared by every mode, set once from CLI flags and env.
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Dry-run: every mutating action logs its intent and stops instead of
    /// calling the cloud.
    pub noop: bool,
    /// Force mode: an instance is also old if its launch time precedes the
    /// controller's start time, even if its launch spec matches.
    pub force: bool,
    /// Per-action deadline; also bounds the sleep following a mutation.
    pub item_timeout: Duration,
    /// Name of the `Terminating:Wait` lifecycle hook to ABANDON.
    pub terminate_hook: String,
    /// Name of the `Pending:Wait` lifecycle hook to ABANDON.
    pub pending_hook: String,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            noop: false,
            force: false,
            item_timeout: DEFAULT_ITEM_TIMEOUT,
            terminate_hook: DEFAULT_TERMINATE_HOOK.to_string(),
            pending_hook: DEFAULT_PENDING_HOOK.to_string(),
        }
    }
}

/// Whether a mutating action actually reached the cloud, or stopped short
/// because `noop` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action reached the cloud client.
    Performed,
    /// `noop` is set; the action logged its intent and did not mutate
    /// anything. The caller must stop the rotation and report success.
    NoopStopped,
}

impl ActionOutcome {
    /// `true` if `noop` stopped the action short.
    #[must_use]
    pub const fn is_noop_stopped(self) -> bool {
        matches!(self, Self::NoopStopped)
    }
}

/// How a mode decider's run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The fleet converged: no old instances, capacity at target, nothing
    /// in flight.
    Done,
    /// `noop` stopped the first intended mutation.
    Noop,
}

/// Owns the cloud client, shared options, the operator's ASG list, the
/// run's start time, and the per-action deadline every mutating action
/// resets.
pub struct Controller {
    client: Arc<dyn CloudClient>,
    opts: ControllerOptions,
    start_time: DateTime<Utc>,
    asgs: Vec<DesiredAsg>,
    deadline: Instant,
    cancel: Option<CancelSignal>,
}

/// Races a future against the cancellation signal; resolves immediately if
/// the signal was already tripped before this call. `None` never resolves,
/// so racing against it is a no-op (used by [`Controller::new`], which has
/// no operator-interrupt signal to watch).
async fn wait_for_cancel(cancel: &mut Option<CancelSignal>) {
    match cancel {
        Some(rx) => {
            if *rx.borrow() {
                return;
            }
            let _ = rx.changed().await;
        }
        None => std::future::pending::<()>().await,
    }
}

impl Controller {
    /// Builds a controller with no operator-interrupt signal wired in.
    /// `start_time` is recorded once and used for the whole run (force-mode
    /// launch-time comparisons, not wall-clock elapsed time).
    #[must_use]
    pub fn new(client: Arc<dyn CloudClient>, opts: ControllerOptions, asgs: Vec<DesiredAsg>) -> Self {
        Self::with_cancel(client, opts, asgs, None)
    }

    /// Builds a controller whose suspension points race against `cancel`,
    /// typically produced by [`spawn_cancellation_listener`].
    #[must_use]
    pub fn with_cancel(
        client: Arc<dyn CloudClient>,
        opts: ControllerOptions,
        asgs: Vec<DesiredAsg>,
        cancel: Option<CancelSignal>,
    ) -> Self {
        let item_timeout = opts.item_timeout;
        Self {
            client,
            opts,
            start_time: Utc::now(),
            asgs,
            deadline: Instant::now() + item_timeout,
            cancel,
        }
    }

    /// The operator's ASG list, in CLI order.
    #[must_use]
    pub fn asgs(&self) -> &[DesiredAsg] {
        &self.asgs
    }

    /// Shared options.
    #[must_use]
    pub const fn opts(&self) -> &ControllerOptions {
        &self.opts
    }

    /// Rebuilds a fresh [`AsgSet`] from the cloud. Discarded by the caller
    /// as soon as the decider returns; nothing here is cached across ticks.
    ///
    /// Races against the operator-interrupt signal: an interrupt mid-poll
    /// surfaces as [`ControllerError::Cancelled`] rather than waiting out
    /// the remaining SDK calls.
    pub async fn new_asg_set(&self) -> Result<AsgSet> {
        let mut cancel = self.cancel.clone();
        tokio::select! {
            res = build_asg_set(self.client.as_ref(), &self.asgs, self.opts.force, self.start_time) => res,
            () = wait_for_cancel(&mut cancel) => Err(ControllerError::Cancelled),
        }
    }

    /// Resets the per-action deadline to `item_timeout` from now. Called
    /// before every mutating action; the same deadline bounds the sleep
    /// that follows it.
    fn reset_deadline(&mut self) {
        self.deadline = Instant::now() + self.opts.item_timeout;
    }

    fn guard_noop(&self, action: &str) -> bool {
        if self.opts.noop {
            tracing::warn!(action, "NOOP only - not actually performing action, stopping rotation");
        }
        self.opts.noop
    }

    /// Sleeps [`WAIT_BETWEEN_CHECKS`], or returns [`ControllerError::Timeout`]
    /// if the per-action deadline expires first.
    ///
    /// An operator interrupt arriving mid-sleep also surfaces as
    /// [`ControllerError::Timeout`], not [`ControllerError::Cancelled`]:
    /// `original_source/bouncer/runner.go`'s poll loop selects on the same
    /// context-done channel for both a real deadline and an explicit
    /// cancel, so both reasons produce the same "timeout exceeded" message.
    pub async fn sleep_between_polls(&self) -> Result<()> {
        if Instant::now() >= self.deadline {
            return Err(ControllerError::Timeout);
        }
        let mut cancel = self.cancel.clone();
        tokio::select! {
            () = tokio::time::sleep(WAIT_BETWEEN_CHECKS) => Ok(()),
            () = tokio::time::sleep_until(self.deadline) => Err(ControllerError::Timeout),
            () = wait_for_cancel(&mut cancel) => Err(ControllerError::Timeout),
        }
    }

    /// Sets a group's desired capacity. Contract: only ever used to
    /// *increase* capacity; decreases go through [`Controller::kill_instance`]
    /// with `decrement = true`.
    pub async fn set_desired_capacity(&mut self, group_name: &str, n: i32) -> Result<ActionOutcome> {
        tracing::info!(asg = group_name, new_desired_capacity = n, "changing desired capacity");
        if self.guard_noop("set_desired_capacity") {
            return Ok(ActionOutcome::NoopStopped);
        }
        self.reset_deadline();
        self.call_cancellable(
            self.client.set_desired_capacity(group_name, n),
            |e| ControllerError::cloud(format!("setting desired capacity of ASG {group_name}"), e),
        )
        .await?;
        Ok(ActionOutcome::Performed)
    }

    /// Races an SDK future against the operator-interrupt signal: if the
    /// interrupt wins, surfaces [`ControllerError::Cancelled`]; otherwise
    /// the call's own error is passed through `map_err` unchanged.
    async fn call_cancellable<T, E>(
        &self,
        fut: impl std::future::Future<Output = std::result::Result<T, E>>,
        map_err: impl FnOnce(E) -> ControllerError,
    ) -> Result<T>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut cancel = self.cancel.clone();
        tokio::select! {
            res = fut => res.map_err(map_err),
            () = wait_for_cancel(&mut cancel) => Err(ControllerError::Cancelled),
        }
    }

    /// Kills one instance: ABANDONs a stuck lifecycle hook if the instance
    /// is in `Pending:Wait`/`Terminating:Wait`, otherwise runs the
    /// instance's pre-terminate command (if any) and terminates it.
    ///
    /// The pre-terminate command runs unconditionally, even under `noop`,
    /// matching `original_source/bouncer/runner.go`'s `KillInstance`: only
    /// the cloud mutation itself is noop-gated.
    pub async fn kill_instance(
        &mut self,
        group_name: &str,
        instance: &InstanceSnapshot,
        decrement: bool,
    ) -> Result<ActionOutcome> {
        tracing::info!(
            asg = group_name,
            instance_id = %instance.instance_id,
            "picked instance to die next"
        );

        match instance.lifecycle_state {
            LifecycleState::PendingWait => self.abandon_hook(group_name, instance, &self.opts.pending_hook.clone()).await,
            LifecycleState::TerminatingWait => {
                self.abandon_hook(group_name, instance, &self.opts.terminate_hook.clone()).await
            }
            _ => {
                if let Some(cmd) = instance.pre_terminate_cmd.clone() {
                    let mut cancel = self.cancel.clone();
                    tokio::select! {
                        res = run_pre_terminate_cmd(&cmd, self.opts.item_timeout) => res?,
                        () = wait_for_cancel(&mut cancel) => return Err(ControllerError::Cancelled),
                    }
                }

                tracing::info!(asg = group_name, instance_id = %instance.instance_id, decrement, "terminating instance");
                if self.guard_noop("terminate_instance") {
                    return Ok(ActionOutcome::NoopStopped);
                }
                self.reset_deadline();
                self.call_cancellable(
                    self.client.terminate_instance(&instance.instance_id, decrement),
                    |e| ControllerError::cloud(format!("terminating instance {}", instance.instance_id), e),
                )
                .await?;
                Ok(ActionOutcome::Performed)
            }
        }
    }

    async fn abandon_hook(&mut self, group_name: &str, instance: &InstanceSnapshot, hook: &str) -> Result<ActionOutcome> {
        tracing::warn!(
            asg = group_name,
            instance_id = %instance.instance_id,
            hook,
            state = %instance.lifecycle_state,
            "issuing ABANDON to hook instead of terminating"
        );
        if self.guard_noop("complete_lifecycle_action") {
            return Ok(ActionOutcome::NoopStopped);
        }
        self.reset_deadline();
        self.call_cancellable(
            self.client
                .complete_lifecycle_action(group_name, &instance.instance_id, hook, LifecycleActionResult::Abandon),
            |e| ControllerError::cloud("completing lifecycle action", e),
        )
        .await?;
        Ok(ActionOutcome::Performed)
    }
}
