//! A hand-written [`CloudClient`] fixture standing in for AWS, swapped in
//! the same way a real backend trait gets swapped for a static stub in
//! tests elsewhere in this workspace. No mocking framework: this is a
//! small, deterministic autoscaling-group simulator that resolves capacity
//! changes and terminations synchronously, so the next poll always
//! observes the settled state rather than a real launch delay.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use bouncer_controller::{
    CloudClient, ControllerError, LifecycleActionResult, RawAsgInstance, RawEc2Instance, RawGroup, RawLaunchTemplateSpec, Result,
};

/// One simulated instance.
#[derive(Debug, Clone)]
pub struct FakeInstance {
    pub id: String,
    pub lifecycle_state: String,
    pub launch_configuration_name: Option<String>,
    pub run_state: String,
    pub launch_time: DateTime<Utc>,
}

impl FakeInstance {
    /// A healthy, in-service instance launched from `lc`.
    #[must_use]
    pub fn inservice(id: &str, lc: &str, launch_time: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            lifecycle_state: "InService".to_string(),
            launch_configuration_name: Some(lc.to_string()),
            run_state: "running".to_string(),
            launch_time,
        }
    }

    /// An instance stuck on a `Pending:Wait` lifecycle hook.
    #[must_use]
    pub fn pending_wait(id: &str, lc: &str, launch_time: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            lifecycle_state: "Pending:Wait".to_string(),
            launch_configuration_name: Some(lc.to_string()),
            run_state: "pending".to_string(),
            launch_time,
        }
    }
}

/// One simulated ASG.
#[derive(Debug, Clone)]
pub struct FakeGroup {
    pub name: String,
    pub desired_capacity: i32,
    pub min_size: i32,
    pub max_size: i32,
    pub current_lc: String,
    pub instances: Vec<FakeInstance>,
}

struct State {
    groups: Vec<FakeGroup>,
    events: Vec<String>,
}

/// A fixture [`CloudClient`] over an in-memory set of [`FakeGroup`]s.
///
/// Every mutating call is appended to an event log (`events()`) so tests can
/// assert the exact action sequence a decider took, matching spec.md's S1-S5
/// scenarios.
pub struct FixtureClient {
    state: Mutex<State>,
}

impl FixtureClient {
    /// Builds a fixture seeded with the given groups.
    #[must_use]
    pub fn new(groups: Vec<FakeGroup>) -> Self {
        Self {
            state: Mutex::new(State { groups, events: Vec::new() }),
        }
    }

    /// The ordered log of mutating calls made against this fixture.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }

    fn group_mut<'a>(state: &'a mut State, name: &str) -> Result<&'a mut FakeGroup> {
        state
            .groups
            .iter_mut()
            .find(|g| g.name == name)
            .ok_or_else(|| ControllerError::validation(format!("no such group: {name}")))
    }
}

#[async_trait]
impl CloudClient for FixtureClient {
    async fn list_groups(&self, names: &[String]) -> Result<Vec<RawGroup>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .groups
            .iter()
            .filter(|g| names.is_empty() || names.contains(&g.name))
            .map(to_raw_group)
            .collect())
    }

    async fn get_group(&self, name: &str) -> Result<RawGroup> {
        let state = self.state.lock().unwrap();
        let group = state
            .groups
            .iter()
            .find(|g| g.name == name)
            .ok_or_else(|| ControllerError::validation(format!("no such group: {name}")))?;
        Ok(to_raw_group(group))
    }

    async fn list_instance(&self, instance_id: &str) -> Result<RawEc2Instance> {
        let state = self.state.lock().unwrap();
        let inst = state
            .groups
            .iter()
            .flat_map(|g| &g.instances)
            .find(|i| i.id == instance_id)
            .ok_or_else(|| ControllerError::validation(format!("no such instance: {instance_id}")))?;
        Ok(RawEc2Instance {
            instance_id: inst.id.clone(),
            state_name: inst.run_state.clone(),
            launch_time: inst.launch_time,
        })
    }

    async fn resolve_template_version(&self, _template_id: &str, _version: &str) -> Result<i64> {
        Ok(1)
    }

    async fn set_desired_capacity(&self, group_name: &str, desired_capacity: i32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(format!("set_desired_capacity({group_name}, {desired_capacity})"));
        let current_lc = Self::group_mut(&mut state, group_name)?.current_lc.clone();
        let group = Self::group_mut(&mut state, group_name)?;
        let previous = group.desired_capacity;
        group.desired_capacity = desired_capacity;
        if desired_capacity > previous {
            for i in previous..desired_capacity {
                let id = format!("{group_name}-new-{i}");
                group.instances.push(FakeInstance::inservice(&id, &current_lc, Utc::now()));
            }
        }
        Ok(())
    }

    async fn terminate_instance(&self, instance_id: &str, decrement_capacity: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .events
            .push(format!("terminate_instance({instance_id}, decrement={decrement_capacity})"));
        for group in &mut state.groups {
            if let Some(pos) = group.instances.iter().position(|i| i.id == instance_id) {
                group.instances.remove(pos);
                if decrement_capacity {
                    group.desired_capacity -= 1;
                } else {
                    // Real ASGs replace a terminated instance on their own
                    // when desired capacity doesn't drop; simulate that
                    // synchronously rather than modelling a launch delay.
                    let replacement_id = format!("{}-replacement-{}", group.name, group.instances.len());
                    let lc = group.current_lc.clone();
                    group.instances.push(FakeInstance::inservice(&replacement_id, &lc, Utc::now()));
                }
                return Ok(());
            }
        }
        Err(ControllerError::validation(format!("no such instance: {instance_id}")))
    }

    async fn complete_lifecycle_action(
        &self,
        group_name: &str,
        instance_id: &str,
        hook_name: &str,
        result: LifecycleActionResult,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(format!(
            "complete_lifecycle_action({group_name}, {instance_id}, {hook_name}, {})",
            result.as_str()
        ));
        let group = Self::group_mut(&mut state, group_name)?;
        if let Some(pos) = group.instances.iter().position(|i| i.id == instance_id) {
            group.instances.remove(pos);
        }
        Ok(())
    }

    async fn get_user_data(&self, _instance_id: &str) -> Result<String> {
        Ok(String::new())
    }
}

fn to_raw_group(group: &FakeGroup) -> RawGroup {
    RawGroup {
        name: group.name.clone(),
        desired_capacity: group.desired_capacity,
        min_size: group.min_size,
        max_size: group.max_size,
        launch_configuration_name: Some(group.current_lc.clone()),
        launch_template: None,
        instances: group
            .instances
            .iter()
            .map(|i| RawAsgInstance {
                instance_id: i.id.clone(),
                lifecycle_state: i.lifecycle_state.clone(),
                launch_configuration_name: i.launch_configuration_name.clone(),
                launch_template: None::<RawLaunchTemplateSpec>,
            })
            .collect(),
        tags: Vec::new(),
    }
}
