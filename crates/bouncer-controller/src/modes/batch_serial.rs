//! Batch-serial mode: shrink-then-grow in batches of at most `batch_size`.
//! A canary-style single kill establishes the first replacement, then
//! healthy old instances are killed `batch_size` at a time (decrementing
//! capacity each time so the ASG never launches a premature replacement),
//! followed by a regrow back to the target once a batch settles.
//!
//! Grounded on `original_source/batchserial/runner.go`.

use bouncer_core::InstanceSnapshot;

use crate::controller::{ActionOutcome, Controller, RotationOutcome};
use crate::error::{ControllerError, Result};
use crate::modes::{require_batch_min_slack, require_no_divergence, require_single_asg};

/// Validates single-ASG-ness, a stable starting capacity, and enough slack
/// above the minimum size to shrink by a full batch before refilling.
pub async fn validate_prereqs(controller: &Controller, batch_size: i32) -> Result<()> {
    let set = controller.new_asg_set().await?;
    require_single_asg(&set)?;
    require_no_divergence(&set)?;
    require_batch_min_slack(&set, batch_size)
}

/// Runs batch-serial mode to completion.
pub async fn run(controller: &mut Controller, batch_size: i32) -> Result<RotationOutcome> {
    validate_prereqs(controller, batch_size).await?;

    loop {
        let set = controller.new_asg_set().await?;
        let group = &set.groups[0];
        let group_name = group.group.name.clone();

        // Pre-step: old instances stuck in Pending:Wait are wasted slots;
        // ABANDON them immediately regardless of transient state.
        let stuck_pending: Vec<InstanceSnapshot> = set
            .unhealthy_old_instances()
            .into_iter()
            .filter(|r| matches!(r.instance.lifecycle_state, bouncer_core::LifecycleState::PendingWait))
            .map(|r| r.instance.clone())
            .collect();
        if !stuck_pending.is_empty() {
            for instance in stuck_pending {
                let outcome = controller.kill_instance(&group_name, &instance, true).await?;
                if outcome == ActionOutcome::NoopStopped {
                    return Ok(RotationOutcome::Noop);
                }
                controller.sleep_between_polls().await?;
            }
            continue;
        }

        if set.is_transient() {
            controller.sleep_between_polls().await?;
            continue;
        }

        let desired = group.group.desired_capacity;
        let target = group.desired.final_desired_capacity;
        let old = set.old_instances();
        let new_count = i32::try_from(set.new_instances().len()).unwrap_or(i32::MAX);
        let old_count = i32::try_from(old.len()).unwrap_or(i32::MAX);
        let total_count = new_count + old_count;
        let to_kill = batch_size.min(old_count);

        if old_count == 0 && total_count == target {
            if desired == target {
                tracing::info!("didn't find any old instances or ASGs - we're done here");
                return Ok(RotationOutcome::Done);
            }
            return Err(ControllerError::invariant(
                "batch-serial capacity mismatch",
                format!("desired={desired} target={target} old=0 total={total_count}"),
            ));
        }

        if new_count == 0 && total_count == target {
            let best = set.best_old_instance().ok_or_else(|| {
                ControllerError::invariant("batch-serial: old instance present but best_old_instance is None", format!("old_count={old_count}"))
            })?;
            let instance = best.instance.clone();
            tracing::info!(asg = %group_name, "terminating the canary-style first old node");
            let outcome = controller.kill_instance(&group_name, &instance, true).await?;
            if outcome == ActionOutcome::NoopStopped {
                return Ok(RotationOutcome::Noop);
            }
            controller.sleep_between_polls().await?;
            continue;
        }

        if new_count == 0 && total_count < target {
            let outcome = controller.set_desired_capacity(&group_name, target).await?;
            if outcome == ActionOutcome::NoopStopped {
                return Ok(RotationOutcome::Noop);
            }
            controller.sleep_between_polls().await?;
            continue;
        }

        if total_count == target && to_kill > 0 {
            let healthy_old: Vec<InstanceSnapshot> = set
                .healthy_old_instances()
                .into_iter()
                .map(|r| r.instance.clone())
                .collect();
            let kill_count = usize::try_from(to_kill).unwrap_or(0).min(healthy_old.len());
            tracing::info!(asg = %group_name, batch_size = kill_count, old_remaining = old_count, "killing a batch of old nodes");
            for instance in healthy_old.into_iter().take(kill_count) {
                let outcome = controller.kill_instance(&group_name, &instance, true).await?;
                if outcome == ActionOutcome::NoopStopped {
                    return Ok(RotationOutcome::Noop);
                }
                controller.sleep_between_polls().await?;
            }
            continue;
        }

        if total_count < target {
            let outcome = controller.set_desired_capacity(&group_name, target).await?;
            if outcome == ActionOutcome::NoopStopped {
                return Ok(RotationOutcome::Noop);
            }
            controller.sleep_between_polls().await?;
            continue;
        }

        return Err(ControllerError::invariant(
            "batch-serial undefined condition",
            format!(
                "desired={desired} target={target} old={old_count} new={new_count} total={total_count} to_kill={to_kill}"
            ),
        ));
    }
}
