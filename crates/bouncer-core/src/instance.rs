//! Per-instance launch-spec comparison and the `is_old`/`is_healthy` classifier.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::lifecycle::LifecycleState;

/// The launch specification an ASG (or an instance within it) was built from.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LaunchSpec {
    /// A classic launch configuration, identified by name.
    LaunchConfiguration(String),
    /// A launch template (or a mixed-instances-policy template), identified
    /// by id with the version number the instance actually resolved to.
    LaunchTemplate {
        /// Launch template id.
        id: String,
        /// Resolved numeric version (never "$Default"/"$Latest" — those are
        /// resolved by [`crate::error`]-free SDK lookups before this point).
        resolved_version: i64,
    },
    /// Neither is set on the group record. Seen transiently while an ASG
    /// moves between launch specs.
    Unknown,
}

/// Why an instance was (or wasn't) judged old; carried for the structured
/// debug trace required by the classifier, not used for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OldReason {
    /// Matches the group's current spec.
    Current,
    /// Group uses a launch configuration and the instance has none.
    MissingLaunchConfiguration,
    /// Group uses a launch configuration that differs from the instance's.
    LaunchConfigurationMismatch,
    /// Group uses a launch template the instance wasn't launched from.
    LaunchTemplateMismatch,
    /// Same launch template id, but a different resolved version.
    LaunchTemplateVersionMismatch,
    /// Group's current spec could not be determined (transition race).
    NeitherSpecPresent,
    /// Force mode: instance launched before the controller started.
    ForceModeLaunchTime,
}

/// The instance-side launch identity, as reported by the VM record.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct InstanceLaunchSpec {
    /// Launch configuration name the instance was launched from, if any.
    pub launch_configuration_name: Option<String>,
    /// `(launch_template_id, resolved_version)` the instance was launched
    /// from, if any.
    pub launch_template: Option<(String, i64)>,
}

/// Decides whether an instance is old relative to its group's current launch
/// spec, per the rules of the data model: launch-configuration mismatch,
/// launch-template (id + resolved version) mismatch, the "neither present"
/// transition race, and force-mode launch-time comparison.
#[must_use]
pub fn classify_old(
    instance_id: &str,
    instance_spec: &InstanceLaunchSpec,
    group_spec: &LaunchSpec,
    launch_time: DateTime<Utc>,
    controller_start: DateTime<Utc>,
    force: bool,
) -> (bool, OldReason) {
    let (is_old, reason) = match group_spec {
        LaunchSpec::LaunchConfiguration(current) => {
            match &instance_spec.launch_configuration_name {
                None => (true, OldReason::MissingLaunchConfiguration),
                Some(name) if name != current => (true, OldReason::LaunchConfigurationMismatch),
                Some(_) => (false, OldReason::Current),
            }
        }
        LaunchSpec::LaunchTemplate { id, resolved_version } => {
            match &instance_spec.launch_template {
                None => (true, OldReason::LaunchTemplateMismatch),
                Some((inst_id, _)) if inst_id != id => (true, OldReason::LaunchTemplateMismatch),
                Some((_, inst_version)) if inst_version != resolved_version => {
                    (true, OldReason::LaunchTemplateVersionMismatch)
                }
                Some(_) => (false, OldReason::Current),
            }
        }
        LaunchSpec::Unknown => (true, OldReason::NeitherSpecPresent),
    };

    if !is_old && force && launch_time < controller_start {
        debug!(
            instance_id,
            launch_time = %launch_time,
            controller_start = %controller_start,
            "instance judged old: force mode and launch time precedes run start"
        );
        return (true, OldReason::ForceModeLaunchTime);
    }

    debug!(instance_id, is_old, reason = ?reason, "instance oldness classified");
    (is_old, reason)
}

/// `true` iff the instance is reported `running` by the VM record and
/// `InService` by the ASG.
#[must_use]
pub fn classify_healthy(run_state: &str, lifecycle_state: &LifecycleState) -> bool {
    run_state == "running" && *lifecycle_state == LifecycleState::InService
}

/// One instance within one poll of one ASG.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct InstanceSnapshot {
    /// Cloud-assigned instance id.
    pub instance_id: String,
    /// Lifecycle state the ASG reports for this instance.
    pub lifecycle_state: LifecycleState,
    /// The launch identity the instance was actually built from.
    pub instance_spec: InstanceLaunchSpec,
    /// The VM's reported run state (`"running"`, `"stopped"`, ...).
    pub run_state: String,
    /// When the instance was launched.
    pub launch_time: DateTime<Utc>,
    /// Whether the instance's launch spec is behind the group's current one.
    pub is_old: bool,
    /// Whether the instance is running and `InService`.
    pub is_healthy: bool,
    /// Command to run against this instance before it is terminated,
    /// inherited from the owning [`crate::desired_asg::DesiredAsg`].
    pub pre_terminate_cmd: Option<String>,
}

impl InstanceSnapshot {
    /// Builds a snapshot, running the classifier over the given raw fields.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instance_id: String,
        lifecycle_state: LifecycleState,
        instance_spec: InstanceLaunchSpec,
        run_state: String,
        launch_time: DateTime<Utc>,
        group_spec: &LaunchSpec,
        controller_start: DateTime<Utc>,
        force: bool,
        pre_terminate_cmd: Option<String>,
    ) -> Self {
        let (is_old, _) = classify_old(
            &instance_id,
            &instance_spec,
            group_spec,
            launch_time,
            controller_start,
            force,
        );
        let is_healthy = classify_healthy(&run_state, &lifecycle_state);

        Self {
            instance_id,
            lifecycle_state,
            instance_spec,
            run_state,
            launch_time,
            is_old,
            is_healthy,
            pre_terminate_cmd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn missing_launch_configuration_is_old() {
        let group = LaunchSpec::LaunchConfiguration("lc-v2".to_string());
        let inst = InstanceLaunchSpec::default();
        let (old, reason) = classify_old("i-1", &inst, &group, t(0), t(0), false);
        assert!(old);
        assert_eq!(reason, OldReason::MissingLaunchConfiguration);
    }

    #[test]
    fn matching_launch_configuration_is_not_old() {
        let group = LaunchSpec::LaunchConfiguration("lc-v2".to_string());
        let inst = InstanceLaunchSpec {
            launch_configuration_name: Some("lc-v2".to_string()),
            launch_template: None,
        };
        let (old, reason) = classify_old("i-1", &inst, &group, t(0), t(0), false);
        assert!(!old);
        assert_eq!(reason, OldReason::Current);
    }

    #[test]
    fn mismatched_launch_configuration_is_old() {
        let group = LaunchSpec::LaunchConfiguration("lc-v2".to_string());
        let inst = InstanceLaunchSpec {
            launch_configuration_name: Some("lc-v1".to_string()),
            launch_template: None,
        };
        let (old, reason) = classify_old("i-1", &inst, &group, t(0), t(0), false);
        assert!(old);
        assert_eq!(reason, OldReason::LaunchConfigurationMismatch);
    }

    #[test]
    fn matching_launch_template_and_version_is_not_old() {
        let group = LaunchSpec::LaunchTemplate {
            id: "lt-1".to_string(),
            resolved_version: 4,
        };
        let inst = InstanceLaunchSpec {
            launch_configuration_name: None,
            launch_template: Some(("lt-1".to_string(), 4)),
        };
        let (old, _) = classify_old("i-1", &inst, &group, t(0), t(0), false);
        assert!(!old);
    }

    #[test]
    fn mismatched_template_version_is_old() {
        let group = LaunchSpec::LaunchTemplate {
            id: "lt-1".to_string(),
            resolved_version: 4,
        };
        let inst = InstanceLaunchSpec {
            launch_configuration_name: None,
            launch_template: Some(("lt-1".to_string(), 3)),
        };
        let (old, reason) = classify_old("i-1", &inst, &group, t(0), t(0), false);
        assert!(old);
        assert_eq!(reason, OldReason::LaunchTemplateVersionMismatch);
    }

    #[test]
    fn mismatched_template_id_is_old() {
        let group = LaunchSpec::LaunchTemplate {
            id: "lt-1".to_string(),
            resolved_version: 4,
        };
        let inst = InstanceLaunchSpec {
            launch_configuration_name: None,
            launch_template: Some(("lt-other".to_string(), 4)),
        };
        let (old, reason) = classify_old("i-1", &inst, &group, t(0), t(0), false);
        assert!(old);
        assert_eq!(reason, OldReason::LaunchTemplateMismatch);
    }

    #[test]
    fn neither_spec_present_is_old_by_convention() {
        let group = LaunchSpec::Unknown;
        let inst = InstanceLaunchSpec::default();
        let (old, reason) = classify_old("i-1", &inst, &group, t(0), t(0), false);
        assert!(old);
        assert_eq!(reason, OldReason::NeitherSpecPresent);
    }

    #[test]
    fn force_mode_overrides_a_matching_spec_when_launched_before_start() {
        let group = LaunchSpec::LaunchConfiguration("lc-v2".to_string());
        let inst = InstanceLaunchSpec {
            launch_configuration_name: Some("lc-v2".to_string()),
            launch_template: None,
        };
        let (old, reason) = classify_old("i-1", &inst, &group, t(0), t(100), true);
        assert!(old);
        assert_eq!(reason, OldReason::ForceModeLaunchTime);
    }

    #[test]
    fn force_mode_does_not_affect_instances_launched_after_start() {
        let group = LaunchSpec::LaunchConfiguration("lc-v2".to_string());
        let inst = InstanceLaunchSpec {
            launch_configuration_name: Some("lc-v2".to_string()),
            launch_template: None,
        };
        let (old, _) = classify_old("i-1", &inst, &group, t(200), t(100), true);
        assert!(!old);
    }

    #[test]
    fn healthy_requires_running_and_inservice() {
        assert!(classify_healthy("running", &LifecycleState::InService));
        assert!(!classify_healthy("stopped", &LifecycleState::InService));
        assert!(!classify_healthy("running", &LifecycleState::Pending));
    }
}
