//! Batch-canary mode: kill a single old instance first and wait for its
//! replacement to go healthy, then kill old instances in batches of at most
//! `batch_size`, never decrementing desired capacity, so the ASG's own
//! replacement policy launches each batch's replacements.
//!
//! Grounded on `original_source/batchserial/runner.go`'s batching shape,
//! adapted from decrement-then-regrow to no-decrement auto-replace per
//! spec.md §4.6, with the canary-first step `original_source/canary/runner.go`
//! uses to validate the new launch spec before committing to the rest.

use crate::controller::{ActionOutcome, Controller, RotationOutcome};
use crate::error::Result;
use crate::modes::{require_headroom_batch, require_no_divergence, require_single_asg};

/// Validates single-ASG-ness, a stable starting capacity, and enough
/// headroom for `batch_size` instances to be mid-replacement at once.
pub async fn validate_prereqs(controller: &Controller, batch_size: i32) -> Result<()> {
    let set = controller.new_asg_set().await?;
    require_single_asg(&set)?;
    require_no_divergence(&set)?;
    require_headroom_batch(&set, batch_size)
}

/// Runs batch-canary mode to completion.
pub async fn run(controller: &mut Controller, batch_size: i32) -> Result<RotationOutcome> {
    validate_prereqs(controller, batch_size).await?;

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
        let old = set.old_instances();

        if old.is_empty() {
            if desired == target {
                tracing::info!("didn't find any old instances - we're done here");
                return Ok(RotationOutcome::Done);
            }
            tracing::info!(asg = %group_name, "regrowing to target after last batch settled");
            let outcome = controller.set_desired_capacity(&group_name, target).await?;
            if outcome == ActionOutcome::NoopStopped {
                return Ok(RotationOutcome::Noop);
            }
            controller.sleep_between_polls().await?;
            continue;
        }

        let new_healthy = set.healthy_new_instances().len();
        let batch_len = if new_healthy == 0 {
            tracing::info!(asg = %group_name, "killing a single canary node before batching");
            1
        } else {
            let batch_len = usize::try_from(batch_size).unwrap_or(0).min(old.len());
            tracing::info!(asg = %group_name, batch_size = batch_len, old_remaining = old.len(), "killing a batch of old nodes");
            batch_len
        };
        for r in old.into_iter().take(batch_len) {
            let instance = r.instance.clone();
            let outcome = controller.kill_instance(&group_name, &instance, false).await?;
            if outcome == ActionOutcome::NoopStopped {
                return Ok(RotationOutcome::Noop);
            }
            controller.sleep_between_polls().await?;
        }
    }
}
