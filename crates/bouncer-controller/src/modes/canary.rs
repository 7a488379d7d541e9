//! Canary mode: launch one new instance ahead of the rest, then scale the
//! group out to its full target, then terminate every old instance.
//!
//! Grounded on `original_source/canary/runner.go`.

use crate::controller::{ActionOutcome, Controller, RotationOutcome};
use crate::error::{ControllerError, Result};
use crate::modes::{require_headroom_double, require_no_divergence, require_single_asg};

/// Validates single-ASG-ness, a stable starting capacity, and enough
/// headroom to double capacity at peak.
pub async fn validate_prereqs(controller: &Controller) -> Result<()> {
    let set = controller.new_asg_set().await?;
    require_single_asg(&set)?;
    require_no_divergence(&set)?;
    require_headroom_double(&set)
}

/// Runs canary mode to completion.
pub async fn run(controller: &mut Controller) -> Result<RotationOutcome> {
    validate_prereqs(controller).await?;

    loop {
        let set = controller.new_asg_set().await?;

        // See if we're still waiting on a change issued last iteration to
        // finish or settle, before computing anything off this snapshot.
        if set.is_transient() {
            controller.sleep_between_polls().await?;
            continue;
        }

        let group = &set.groups[0];
        let group_name = group.group.name.clone();
        let desired = group.group.desired_capacity;
        let target = group.desired.final_desired_capacity;
        let new_count = i32::try_from(set.new_instances().len()).unwrap_or(i32::MAX);
        let old_count = i32::try_from(set.old_instances().len()).unwrap_or(i32::MAX);

        if new_count == target {
            if desired == target {
                if old_count == 0 {
                    tracing::info!("didn't find any old instances or ASGs - we're done here");
                    return Ok(RotationOutcome::Done);
                }

                // The transient gate above already ruled out a terminating
                // instance accounting for this; old instances sitting at
                // final capacity with nothing in flight is genuinely stuck.
                return Err(ControllerError::invariant(
                    "old instance mismatch",
                    format!("new={new_count} old={old_count} target={target} desired={desired}, but nothing is terminating"),
                ));
            }

            if old_count == 0 {
                return Err(ControllerError::invariant(
                    "canary capacity mismatch",
                    format!("new={new_count} old={old_count} target={target} desired={desired}"),
                ));
            }

            // We have the right number of new instances with desired still
            // at old + target; issue every old instance's terminate here.
            for r in set.old_instances() {
                let instance = r.instance.clone();
                let outcome = controller.kill_instance(&group_name, &instance, true).await?;
                if outcome == ActionOutcome::NoopStopped {
                    return Ok(RotationOutcome::Noop);
                }
                controller.sleep_between_polls().await?;
            }
            continue;
        }

        let new_desired = if new_count == 0 {
            tracing::info!(asg = %group_name, "adding canary node");
            desired + 1
        } else {
            tracing::info!(asg = %group_name, "adding in remainder of new nodes");
            desired + (target - new_count)
        };

        let outcome = controller.set_desired_capacity(&group_name, new_desired).await?;
        if outcome == ActionOutcome::NoopStopped {
            return Ok(RotationOutcome::Noop);
        }
        controller.sleep_between_polls().await?;
    }
}
