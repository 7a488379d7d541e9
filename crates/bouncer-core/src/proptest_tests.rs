//! Property-based tests for the instance classifier and `best_old_instance`.
//!
//! These use proptest to verify the classifier invariants across many
//! randomly generated launch specs and lifecycle states, rather than a fixed
//! table of examples.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use crate::asg::{AsgSnapshot, GroupRecord};
use crate::asgset::AsgSet;
use crate::desired_asg::DesiredAsg;
use crate::instance::{classify_healthy, classify_old, InstanceLaunchSpec, InstanceSnapshot, LaunchSpec};
use crate::lifecycle::LifecycleState;

fn epoch_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..2_000_000_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn launch_configuration_strategy() -> impl Strategy<Value = LaunchSpec> {
    "lc-[a-z0-9]{4,12}".prop_map(LaunchSpec::LaunchConfiguration)
}

fn launch_template_strategy() -> impl Strategy<Value = LaunchSpec> {
    ("lt-[a-z0-9]{4,12}", 1i64..100).prop_map(|(id, version)| LaunchSpec::LaunchTemplate {
        id,
        resolved_version: version,
    })
}

fn group_spec_strategy() -> impl Strategy<Value = LaunchSpec> {
    prop_oneof![
        launch_configuration_strategy(),
        launch_template_strategy(),
        Just(LaunchSpec::Unknown),
    ]
}

proptest! {
    /// Property 4 (oldness): an instance matching the group's current spec
    /// is never old, unless force mode is on and it launched before the run.
    #[test]
    fn matching_spec_is_old_only_under_force_mode(
        group_spec in group_spec_strategy(),
        launch_time in epoch_strategy(),
        controller_start in epoch_strategy(),
        force in any::<bool>(),
    ) {
        let instance_spec = match &group_spec {
            LaunchSpec::LaunchConfiguration(name) => InstanceLaunchSpec {
                launch_configuration_name: Some(name.clone()),
                launch_template: None,
            },
            LaunchSpec::LaunchTemplate { id, resolved_version } => InstanceLaunchSpec {
                launch_configuration_name: None,
                launch_template: Some((id.clone(), *resolved_version)),
            },
            LaunchSpec::Unknown => {
                // No group spec at all is old by convention regardless of
                // force mode; not the case this property is about.
                return Ok(());
            }
        };

        let (is_old, _) = classify_old(
            "i-test",
            &instance_spec,
            &group_spec,
            launch_time,
            controller_start,
            force,
        );

        let expect_old_from_force = force && launch_time < controller_start;
        prop_assert_eq!(is_old, expect_old_from_force);
    }

    /// Property 3 (classification): `is_healthy` is true exactly when the
    /// run state is "running" and the lifecycle state is InService.
    #[test]
    fn healthy_iff_running_and_inservice(
        run_state in "(running|stopped|stopping|pending|shutting-down|terminated)",
        state_idx in 0..13usize,
    ) {
        let states = [
            "Pending", "Pending:Wait", "Pending:Proceed", "InService", "Terminating",
            "Terminating:Wait", "Terminating:Proceed", "Terminated", "Detaching",
            "Detached", "EnteringStandby", "Standby", "Quarantined",
        ];
        let lifecycle = LifecycleState::parse(states[state_idx]);
        let healthy = classify_healthy(&run_state, &lifecycle);
        let expected = run_state == "running" && lifecycle == LifecycleState::InService;
        prop_assert_eq!(healthy, expected);
    }
}

fn instance_with(id: &str, is_old: bool, is_healthy: bool, launch_secs: i64) -> InstanceSnapshot {
    InstanceSnapshot {
        instance_id: id.to_string(),
        lifecycle_state: LifecycleState::InService,
        instance_spec: InstanceLaunchSpec::default(),
        run_state: "running".to_string(),
        launch_time: Utc.timestamp_opt(launch_secs, 0).unwrap(),
        is_old,
        is_healthy,
        pre_terminate_cmd: None,
    }
}

proptest! {
    /// Property 5 (best-old tie-break): with exactly one unhealthy-old
    /// instance among any number of healthy-old instances, that unhealthy
    /// one is always `best_old_instance`.
    #[test]
    fn best_old_always_prefers_the_lone_unhealthy_instance(
        healthy_launch_times in prop::collection::vec(0i64..1_000_000, 0..8),
        unhealthy_launch_time in 0i64..1_000_000,
    ) {
        let mut instances: Vec<InstanceSnapshot> = healthy_launch_times
            .iter()
            .enumerate()
            .map(|(i, secs)| instance_with(&format!("healthy-{i}"), true, true, *secs))
            .collect();
        instances.push(instance_with("unhealthy", true, false, unhealthy_launch_time));

        let snapshot = AsgSnapshot {
            desired: DesiredAsg {
                name: "svc".to_string(),
                final_desired_capacity: i32::try_from(instances.len()).unwrap(),
                pre_terminate_cmd: None,
            },
            group: GroupRecord::new(
                "svc".to_string(),
                i32::try_from(instances.len()).unwrap(),
                1,
                10,
                LaunchSpec::LaunchConfiguration("lc-current".to_string()),
            ),
            instances,
        };

        let set = AsgSet::new(vec![snapshot]);
        let best = set.best_old_instance().expect("at least one old instance");
        prop_assert_eq!(best.instance.instance_id.as_str(), "unhealthy");
    }
}
