//! Slow-canary mode: grow by one canary node ahead of the target, then kill
//! old instances one at a time — decrementing only on the last one — so the
//! group spends almost all of its time at `final_desired_capacity + 1`
//! instead of canary mode's full double-capacity peak.
//!
//! Grounded on `original_source/slowcanary/runner.go`.

use crate::controller::{ActionOutcome, Controller, RotationOutcome};
use crate::error::{ControllerError, Result};
use crate::modes::{require_headroom_plus_one, require_no_divergence, require_single_asg};

/// Validates single-ASG-ness, a stable starting capacity, and enough
/// headroom to grow by one canary node.
pub async fn validate_prereqs(controller: &Controller) -> Result<()> {
    let set = controller.new_asg_set().await?;
    require_single_asg(&set)?;
    require_no_divergence(&set)?;
    require_headroom_plus_one(&set)
}

/// Runs slow-canary mode to completion.
pub async fn run(controller: &mut Controller) -> Result<RotationOutcome> {
    validate_prereqs(controller).await?;

    loop {
        let set = controller.new_asg_set().await?;

        if set.is_transient() {
            controller.sleep_between_polls().await?;
            continue;
        }

        let group = &set.groups[0];
        let group_name = group.group.name.clone();
        let desired = group.group.desired_capacity;
        let target = group.desired.final_desired_capacity;
        let old_count = i32::try_from(set.old_instances().len()).unwrap_or(i32::MAX);

        if desired == target {
            if old_count == 0 {
                tracing::info!("didn't find any old instances or ASGs - we're done here");
                return Ok(RotationOutcome::Done);
            }

            tracing::info!(asg = %group_name, "adding slow-canary node");
            let outcome = controller.set_desired_capacity(&group_name, desired + 1).await?;
            if outcome == ActionOutcome::NoopStopped {
                return Ok(RotationOutcome::Noop);
            }
            controller.sleep_between_polls().await?;
            continue;
        }

        if desired == target + 1 {
            if old_count == 0 {
                return Err(ControllerError::invariant(
                    "slow-canary capacity mismatch",
                    format!("desired={desired} target={target} old=0"),
                ));
            }

            let best = set.best_old_instance().ok_or_else(|| {
                ControllerError::invariant("slow-canary: old instance present but best_old_instance is None", format!("old_count={old_count}"))
            })?;
            let instance = best.instance.clone();
            let decrement = old_count == 1;
            if decrement {
                tracing::info!(asg = %group_name, "killing the last old node, not letting the ASG replace it");
            } else {
                tracing::info!(asg = %group_name, "killing an old node, letting the ASG replace it");
            }

            let outcome = controller.kill_instance(&group_name, &instance, decrement).await?;
            if outcome == ActionOutcome::NoopStopped {
                return Ok(RotationOutcome::Noop);
            }
            controller.sleep_between_polls().await?;
            continue;
        }

        return Err(ControllerError::invariant(
            "slow-canary capacity mismatch",
            format!("desired={desired} target={target}"),
        ));
    }
}
