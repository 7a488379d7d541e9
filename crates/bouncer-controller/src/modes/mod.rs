//! One module per rotation mode, each a self-contained poll loop over a
//! shared [`crate::controller::Controller`]. Every mode validates its own
//! prerequisites once before entering the loop; a failed prerequisite is a
//! startup error, never recoverable (spec.md §4.6).

pub mod batch_canary;
pub mod batch_serial;
pub mod canary;
pub mod full;
pub mod rolling;
pub mod serial;
pub mod slow_canary;

use bouncer_core::AsgSet;

use crate::error::{ControllerError, Result};

/// Fails unless every group's desired capacity matches its operator target.
/// Required by modes that need a stable starting point (serial, full,
/// canary, slow-canary, batch-canary, batch-serial).
pub fn require_no_divergence(set: &AsgSet) -> Result<()> {
    let diverged = set.diverged_asgs();
    if diverged.is_empty() {
        return Ok(());
    }
    for g in &diverged {
        tracing::error!(
            asg = %g.group.name,
            desired_capacity_actual = g.group.desired_capacity,
            desired_capacity_given = g.desired.final_desired_capacity,
            "ASG desired capacity doesn't match expected starting value"
        );
    }
    Err(ControllerError::validation(
        "ASG desired capacity doesn't match expected starting value",
    ))
}

/// Fails unless exactly one ASG was supplied. Required by the single-ASG
/// modes (canary, slow-canary, batch-canary, batch-serial).
pub fn require_single_asg(set: &AsgSet) -> Result<()> {
    if set.groups.len() == 1 {
        Ok(())
    } else {
        Err(ControllerError::validation(format!(
            "this mode supports only 1 ASG at a time, got {}",
            set.groups.len()
        )))
    }
}

/// Fails unless every group's minimum size is zero. Required by full mode,
/// which drains each group to zero before refilling.
pub fn require_zero_min_size(set: &AsgSet) -> Result<()> {
    for g in &set.groups {
        if g.group.min_size != 0 {
            return Err(ControllerError::validation(format!(
                "ASG {:?} min size must equal 0, got {}",
                g.group.name, g.group.min_size
            )));
        }
    }
    Ok(())
}

/// Fails unless every group's desired capacity is strictly above its
/// minimum size. Required by serial mode, which shrinks by one before
/// replacing.
pub fn require_min_slack(set: &AsgSet) -> Result<()> {
    for g in &set.groups {
        if g.group.desired_capacity <= g.group.min_size {
            return Err(ControllerError::validation(format!(
                "ASG {:?} desired capacity ({}) must be at least 1 higher than min size ({})",
                g.group.name, g.group.desired_capacity, g.group.min_size
            )));
        }
    }
    Ok(())
}

/// Fails unless every group's desired capacity minus `batch_size` is at
/// least its minimum size. Required by batch-serial mode.
pub fn require_batch_min_slack(set: &AsgSet, batch_size: i32) -> Result<()> {
    for g in &set.groups {
        if g.group.desired_capacity - batch_size < g.group.min_size {
            return Err(ControllerError::validation(format!(
                "ASG {:?} min size ({}) must be <= desired capacity ({}) minus batch size ({})",
                g.group.name, g.group.min_size, g.group.desired_capacity, batch_size
            )));
        }
    }
    Ok(())
}

/// Fails unless `desired_capacity + 1 <= max_size` for every group.
/// Required by slow-canary mode, which grows by one canary node ahead of
/// the group's target.
pub fn require_headroom_plus_one(set: &AsgSet) -> Result<()> {
    for g in &set.groups {
        if g.group.desired_capacity + 1 > g.group.max_size {
            return Err(ControllerError::validation(format!(
                "ASG {:?} max size ({}) must be at least 1 + desired capacity ({})",
                g.group.name, g.group.max_size, g.group.desired_capacity
            )));
        }
    }
    Ok(())
}

/// Fails unless `2 * desired_capacity <= max_size` for every group.
/// Required by canary mode, which doubles capacity at peak.
pub fn require_headroom_double(set: &AsgSet) -> Result<()> {
    for g in &set.groups {
        if g.group.desired_capacity.saturating_mul(2) > g.group.max_size {
            return Err(ControllerError::validation(format!(
                "ASG {:?} desired capacity ({}) must be less than or equal to half of max size ({})",
                g.group.name, g.group.desired_capacity, g.group.max_size
            )));
        }
    }
    Ok(())
}

/// Fails unless `desired_capacity + batch_size <= max_size`. Required by
/// batch-canary mode.
pub fn require_headroom_batch(set: &AsgSet, batch_size: i32) -> Result<()> {
    for g in &set.groups {
        if g.group.desired_capacity + batch_size > g.group.max_size {
            return Err(ControllerError::validation(format!(
                "ASG {:?} max size ({}) must be at least desired capacity ({}) plus batch size ({})",
                g.group.name, g.group.max_size, g.group.desired_capacity, batch_size
            )));
        }
    }
    Ok(())
}
