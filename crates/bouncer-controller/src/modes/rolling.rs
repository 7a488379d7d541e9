//! Rolling mode: kill the best old instance one at a time, no capacity
//! change. The ASG's own replacement policy launches the new node.
//!
//! Grounded on `original_source/rolling/runner.go`.

use crate::controller::{ActionOutcome, Controller, RotationOutcome};
use crate::error::{ControllerError, Result};
use crate::modes::require_no_divergence;

/// Validates that no group has drifted from its operator-supplied target
/// before the loop starts.
pub async fn validate_prereqs(controller: &Controller) -> Result<()> {
    let set = controller.new_asg_set().await?;
    require_no_divergence(&set)
}

/// Runs rolling mode to completion.
pub async fn run(controller: &mut Controller) -> Result<RotationOutcome> {
    validate_prereqs(controller).await?;

    loop {
        let set = controller.new_asg_set().await?;

        if set.is_transient() {
            controller.sleep_between_polls().await?;
            continue;
        }

        let old = set.old_instances();
        if old.is_empty() {
            tracing::info!("didn't find any old instances - we're done here");
            return Ok(RotationOutcome::Done);
        }

        let best = set.best_old_instance().ok_or_else(|| {
            ControllerError::invariant("rolling: old instance present but best_old_instance is None", format!("old_count={}", old.len()))
        })?;
        let group_name = best.group.group.name.clone();
        let instance = best.instance.clone();

        let outcome = controller.kill_instance(&group_name, &instance, false).await?;
        if outcome == ActionOutcome::NoopStopped {
            return Ok(RotationOutcome::Noop);
        }
        controller.sleep_between_polls().await?;
    }
}
