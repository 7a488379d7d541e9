//! A snapshot of every operator-targeted ASG, and the predicates every mode
//! decider is built from.

use tracing::info;

use crate::asg::AsgSnapshot;
use crate::instance::InstanceSnapshot;

/// An instance paired with the group it belongs to.
///
/// Avoids a back-pointer cycle in [`InstanceSnapshot`]: the pairing is
/// formed on demand by the predicates below rather than stored on the
/// instance itself, so `AsgSnapshot` stays a plain, cheaply-cloneable value.
#[derive(Debug, Clone, Copy)]
pub struct InstanceRef<'a> {
    /// The group the instance belongs to.
    pub group: &'a AsgSnapshot,
    /// The instance itself.
    pub instance: &'a InstanceSnapshot,
}

/// Ordered collection of [`AsgSnapshot`], one per operator-supplied target.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct AsgSet {
    /// The snapshots, in the order the operator listed them on the CLI.
    pub groups: Vec<AsgSnapshot>,
}

impl AsgSet {
    /// Builds a set from already-classified group snapshots.
    #[must_use]
    pub const fn new(groups: Vec<AsgSnapshot>) -> Self {
        Self { groups }
    }

    fn all_instances(&self) -> impl Iterator<Item = InstanceRef<'_>> {
        self.groups.iter().flat_map(|group| {
            group
                .instances
                .iter()
                .map(move |instance| InstanceRef { group, instance })
        })
    }

    /// Instances whose launch spec is behind their group's current one.
    #[must_use]
    pub fn old_instances(&self) -> Vec<InstanceRef<'_>> {
        self.all_instances().filter(|r| r.instance.is_old).collect()
    }

    /// Instances matching their group's current launch spec.
    #[must_use]
    pub fn new_instances(&self) -> Vec<InstanceRef<'_>> {
        self.all_instances().filter(|r| !r.instance.is_old).collect()
    }

    /// New instances that are not yet healthy.
    #[must_use]
    pub fn unhealthy_new_instances(&self) -> Vec<InstanceRef<'_>> {
        self.all_instances()
            .filter(|r| !r.instance.is_old && !r.instance.is_healthy)
            .collect()
    }

    /// New instances that are healthy.
    #[must_use]
    pub fn healthy_new_instances(&self) -> Vec<InstanceRef<'_>> {
        self.all_instances()
            .filter(|r| !r.instance.is_old && r.instance.is_healthy)
            .collect()
    }

    /// Old instances that are healthy.
    #[must_use]
    pub fn healthy_old_instances(&self) -> Vec<InstanceRef<'_>> {
        self.all_instances()
            .filter(|r| r.instance.is_old && r.instance.is_healthy)
            .collect()
    }

    /// Old instances that are not healthy.
    #[must_use]
    pub fn unhealthy_old_instances(&self) -> Vec<InstanceRef<'_>> {
        self.all_instances()
            .filter(|r| r.instance.is_old && !r.instance.is_healthy)
            .collect()
    }

    /// Instances whose lifecycle state is `Terminating`, `Terminating:Wait`
    /// or `Terminating:Proceed`.
    #[must_use]
    pub fn terminating_instances(&self) -> Vec<InstanceRef<'_>> {
        self.all_instances()
            .filter(|r| r.instance.lifecycle_state.is_terminating())
            .collect()
    }

    /// Instances in a state where `CompleteLifecycleAction` is not accepted.
    #[must_use]
    pub fn immutable_instances(&self) -> Vec<InstanceRef<'_>> {
        self.all_instances()
            .filter(|r| r.instance.lifecycle_state.is_immutable())
            .collect()
    }

    /// Groups whose reported instance count doesn't match their own desired
    /// capacity.
    #[must_use]
    pub fn actual_bad_count_asgs(&self) -> Vec<&AsgSnapshot> {
        self.groups
            .iter()
            .filter(|g| g.has_actual_count_mismatch())
            .collect()
    }

    /// Groups whose desired capacity has drifted from the operator's target.
    #[must_use]
    pub fn diverged_asgs(&self) -> Vec<&AsgSnapshot> {
        self.groups.iter().filter(|g| g.is_diverged()).collect()
    }

    /// The lowest-priority old instance to kill next: prefer unhealthy over
    /// healthy, then the oldest by launch time, then the first seen.
    #[must_use]
    pub fn best_old_instance(&self) -> Option<InstanceRef<'_>> {
        let old = self.old_instances();
        let unhealthy: Vec<_> = old.iter().copied().filter(|r| !r.instance.is_healthy).collect();
        let pool = if unhealthy.is_empty() { old } else { unhealthy };
        pool.into_iter().min_by_key(|r| r.instance.launch_time)
    }

    /// `true` iff any instance is in flight: terminating, new-but-unhealthy,
    /// immutable, or the group's instance count doesn't match its desired
    /// capacity.
    ///
    /// Checks short-circuit in this order so that a stalled tick logs every
    /// distinct cause exactly once, never an instance twice for satisfying
    /// two predicates at once: (terminating OR unhealthy-new) first,
    /// immutable second, count-mismatch last.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        let terminating = self.terminating_instances();
        let unhealthy_new = self.unhealthy_new_instances();
        if !terminating.is_empty() || !unhealthy_new.is_empty() {
            for r in &terminating {
                info!(
                    asg = %r.group.group.name,
                    instance_id = %r.instance.instance_id,
                    state = %r.instance.lifecycle_state,
                    "instance still terminating"
                );
            }
            for r in &unhealthy_new {
                info!(
                    asg = %r.group.group.name,
                    instance_id = %r.instance.instance_id,
                    state = %r.instance.lifecycle_state,
                    "new instance not yet healthy"
                );
            }
            return true;
        }

        let immutable = self.immutable_instances();
        if !immutable.is_empty() {
            for r in &immutable {
                info!(
                    asg = %r.group.group.name,
                    instance_id = %r.instance.instance_id,
                    state = %r.instance.lifecycle_state,
                    "instance in immutable transition"
                );
            }
            return true;
        }

        let bad_count = self.actual_bad_count_asgs();
        if !bad_count.is_empty() {
            for g in &bad_count {
                info!(
                    asg = %g.group.name,
                    desired_capacity = g.group.desired_capacity,
                    instance_count = g.instances.len(),
                    "ASG instance count doesn't match desired capacity yet"
                );
            }
            return true;
        }

        false
    }
}
