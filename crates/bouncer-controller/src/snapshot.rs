//! Builds a fresh [`AsgSet`] from the cloud client and the operator's
//! [`DesiredAsg`] list. Rebuilt from scratch on every poll tick; nothing
//! here is cached across ticks.

use chrono::{DateTime, Utc};

use bouncer_core::{AsgSet, AsgSnapshot, DesiredAsg, GroupRecord, InstanceLaunchSpec, InstanceSnapshot, LaunchSpec, LifecycleState};

use crate::cloud::{CloudClient, RawGroup};
use crate::error::{ControllerError, Result};

/// Resolves an ASG's current launch spec to the [`LaunchSpec`] the
/// classifier compares instances against. Mixed-instances-policy groups and
/// plain launch-template groups both carry `launch_template`; a group with
/// neither set is the transition race of the data model, resolved as
/// [`LaunchSpec::Unknown`].
async fn resolve_group_launch_spec(client: &dyn CloudClient, group: &RawGroup) -> Result<LaunchSpec> {
    match (&group.launch_configuration_name, &group.launch_template) {
        (Some(name), _) => Ok(LaunchSpec::LaunchConfiguration(name.clone())),
        (None, Some(lt)) => {
            let resolved_version = client.resolve_template_version(&lt.id, &lt.version).await?;
            Ok(LaunchSpec::LaunchTemplate {
                id: lt.id.clone(),
                resolved_version,
            })
        }
        (None, None) => Ok(LaunchSpec::Unknown),
    }
}

/// Resolves one instance's own launch template version string (if it has
/// one) against the same template the group uses, so the comparison in
/// [`bouncer_core::instance::classify_old`] is always between two resolved
/// version numbers.
async fn resolve_instance_launch_spec(
    client: &dyn CloudClient,
    instance: &crate::cloud::RawAsgInstance,
) -> Result<InstanceLaunchSpec> {
    let launch_template = match &instance.launch_template {
        Some(lt) => {
            let resolved_version = client.resolve_template_version(&lt.id, &lt.version).await?;
            Some((lt.id.clone(), resolved_version))
        }
        None => None,
    };
    Ok(InstanceLaunchSpec {
        launch_configuration_name: instance.launch_configuration_name.clone(),
        launch_template,
    })
}

/// Builds one [`AsgSnapshot`] for a single operator-targeted group.
async fn build_one(
    client: &dyn CloudClient,
    desired: &DesiredAsg,
    force: bool,
    controller_start: DateTime<Utc>,
) -> Result<AsgSnapshot> {
    let raw = client.get_group(&desired.name).await?;
    let group_spec = resolve_group_launch_spec(client, &raw).await?;

    let mut instances = Vec::with_capacity(raw.instances.len());
    for raw_inst in &raw.instances {
        let instance_spec = resolve_instance_launch_spec(client, raw_inst).await?;
        let ec2 = client.list_instance(&raw_inst.instance_id).await?;
        instances.push(InstanceSnapshot::new(
            raw_inst.instance_id.clone(),
            LifecycleState::parse(&raw_inst.lifecycle_state),
            instance_spec,
            ec2.state_name,
            ec2.launch_time,
            &group_spec,
            controller_start,
            force,
            desired.pre_terminate_cmd.clone(),
        ));
    }

    let group = GroupRecord::new(
        raw.name.clone(),
        raw.desired_capacity,
        raw.min_size,
        raw.max_size,
        group_spec,
    )
    .with_tags(raw.tags.clone());

    Ok(AsgSnapshot {
        desired: desired.clone(),
        group,
        instances,
    })
}

/// Builds a fresh [`AsgSet`], one [`AsgSnapshot`] per entry in `desired`, in
/// the order the operator supplied them.
pub async fn build_asg_set(
    client: &dyn CloudClient,
    desired: &[DesiredAsg],
    force: bool,
    controller_start: DateTime<Utc>,
) -> Result<AsgSet> {
    if desired.is_empty() {
        return Err(ControllerError::validation("no ASGs given"));
    }
    let mut groups = Vec::with_capacity(desired.len());
    for d in desired {
        groups.push(build_one(client, d, force, controller_start).await?);
    }
    Ok(AsgSet::new(groups))
}
