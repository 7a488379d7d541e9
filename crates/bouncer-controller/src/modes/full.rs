//! Full mode: drain every group to zero old instances one at a time (in
//! ASG order), then refill each group back to its target one instance at a
//! time (in *reversed* ASG order, so operators can declare dependency
//! order leaves-first).
//!
//! Grounded on `original_source/full/runner.go`.

use bouncer_core::AsgSet;

use crate::controller::{ActionOutcome, Controller, RotationOutcome};
use crate::error::Result;
use crate::modes::{require_no_divergence, require_zero_min_size};

/// Validates that every group starts undiverged and with a zero minimum
/// size (the mode must be able to drain a group to zero).
pub async fn validate_prereqs(controller: &Controller) -> Result<()> {
    let set = controller.new_asg_set().await?;
    require_no_divergence(&set)?;
    require_zero_min_size(&set)
}

/// Runs full mode to completion.
pub async fn run(controller: &mut Controller) -> Result<RotationOutcome> {
    validate_prereqs(controller).await?;

    'tick: loop {
        let set = controller.new_asg_set().await?;

        if set.is_transient() {
            controller.sleep_between_polls().await?;
            continue;
        }

        for group in &set.groups {
            let single = AsgSet::new(vec![group.clone()]);
            if single.old_instances().is_empty() {
                continue;
            }
            let best = single.best_old_instance().expect("old_instances non-empty implies a best_old_instance");
            let group_name = best.group.group.name.clone();
            let instance = best.instance.clone();

            let outcome = controller.kill_instance(&group_name, &instance, true).await?;
            if outcome == ActionOutcome::NoopStopped {
                return Ok(RotationOutcome::Noop);
            }
            controller.sleep_between_polls().await?;
            continue 'tick;
        }

        for group in set.groups.iter().rev() {
            if group.group.desired_capacity < group.desired.final_desired_capacity {
                let new_cap = group.group.desired_capacity + 1;
                let outcome = controller.set_desired_capacity(&group.group.name, new_cap).await?;
                if outcome == ActionOutcome::NoopStopped {
                    return Ok(RotationOutcome::Noop);
                }
                controller.sleep_between_polls().await?;
                continue 'tick;
            }
        }

        tracing::info!("every ASG drained and refilled - we're done here");
        return Ok(RotationOutcome::Done);
    }
}
