//! Serial mode: kill the best old instance one at a time, decrementing
//! desired capacity so the ASG's own (availability-zone-driven) replacement
//! policy never picks the victim; grow diverged groups back to target
//! before touching any instance.
//!
//! Grounded on `original_source/serial/runner.go`.

use crate::controller::{ActionOutcome, Controller, RotationOutcome};
use crate::error::{ControllerError, Result};
use crate::modes::require_min_slack;

/// Validates that every group has enough slack above its minimum size to
/// shrink by one before the loop starts.
pub async fn validate_prereqs(controller: &Controller) -> Result<()> {
    let set = controller.new_asg_set().await?;
    require_min_slack(&set)
}

/// Runs serial mode to completion.
pub async fn run(controller: &mut Controller) -> Result<RotationOutcome> {
    validate_prereqs(controller).await?;

    loop {
        let set = controller.new_asg_set().await?;

        if set.is_transient() {
            controller.sleep_between_polls().await?;
            continue;
        }

        let diverged: Vec<(String, i32)> = set
            .diverged_asgs()
            .into_iter()
            .map(|g| (g.group.name.clone(), g.desired.final_desired_capacity))
            .collect();
        if !diverged.is_empty() {
            for (name, target) in diverged {
                let outcome = controller.set_desired_capacity(&name, target).await?;
                if outcome == ActionOutcome::NoopStopped {
                    return Ok(RotationOutcome::Noop);
                }
            }
            controller.sleep_between_polls().await?;
            continue;
        }

        let old = set.old_instances();
        if old.is_empty() {
            tracing::info!("didn't find any old instances or ASGs - we're done here");
            return Ok(RotationOutcome::Done);
        }

        let best = set.best_old_instance().ok_or_else(|| {
            ControllerError::invariant("serial: old instance present but best_old_instance is None", format!("old_count={}", old.len()))
        })?;
        let group_name = best.group.group.name.clone();
        let instance = best.instance.clone();

        let outcome = controller.kill_instance(&group_name, &instance, true).await?;
        if outcome == ActionOutcome::NoopStopped {
            return Ok(RotationOutcome::Noop);
        }
        controller.sleep_between_polls().await?;
    }
}
