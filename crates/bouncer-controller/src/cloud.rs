//! Thin typed adapter over the cloud SDK calls the controller needs.
//!
//! [`CloudClient`] is the seam the mode deciders and [`crate::controller::Controller`]
//! are tested against: [`AwsCloudClient`] is the production implementation over
//! `aws-sdk-autoscaling`/`aws-sdk-ec2`, and tests substitute a hand-written
//! fixture implementing the same trait against an in-memory group.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{ControllerError, Result};

/// A launch template reference as reported on an ASG or instance record:
/// an id plus an unresolved version string (`"$Default"`, `"$Latest"`, or a
/// literal version number).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLaunchTemplateSpec {
    /// Launch template id.
    pub id: String,
    /// Unresolved version string.
    pub version: String,
}

/// One instance as reported within its owning ASG's member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAsgInstance {
    /// Cloud-assigned instance id.
    pub instance_id: String,
    /// Lifecycle state string, exactly as the cloud reports it.
    pub lifecycle_state: String,
    /// Launch configuration name the instance was launched from, if any.
    pub launch_configuration_name: Option<String>,
    /// Launch template the instance was launched from, if any.
    pub launch_template: Option<RawLaunchTemplateSpec>,
}

/// The cloud's record for one ASG, including its member instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawGroup {
    /// Name of the autoscaling group.
    pub name: String,
    /// Current desired capacity.
    pub desired_capacity: i32,
    /// Minimum size.
    pub min_size: i32,
    /// Maximum size.
    pub max_size: i32,
    /// Launch configuration name the group currently uses, if any.
    pub launch_configuration_name: Option<String>,
    /// Launch template (or mixed-instances-policy template) the group
    /// currently uses, if any.
    pub launch_template: Option<RawLaunchTemplateSpec>,
    /// The group's member instances, in the order the cloud returned them.
    pub instances: Vec<RawAsgInstance>,
    /// Free-form tags attached to the group.
    pub tags: Vec<(String, String)>,
}

/// The VM record for one instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEc2Instance {
    /// Cloud-assigned instance id.
    pub instance_id: String,
    /// Reported run state (`"running"`, `"stopped"`, ...).
    pub state_name: String,
    /// When the instance was launched.
    pub launch_time: DateTime<Utc>,
}

/// Outcome passed to `CompleteLifecycleAction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleActionResult {
    /// Force the hook to finish, dropping the instance from the group.
    Abandon,
    /// Tell the hook to proceed normally.
    Continue,
}

impl LifecycleActionResult {
    /// The literal string the cloud API expects.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Abandon => "ABANDON",
            Self::Continue => "CONTINUE",
        }
    }
}

/// Exactly the cloud operations the controller uses: a thin, cancellable,
/// single-shot-on-mutation adapter. Read calls may retry internally; no
/// mutating call is ever retried by an implementation.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// Lists groups by name, or every group if `names` is empty. Paginated
    /// calls sleep 200ms between pages to avoid burst-throttling.
    async fn list_groups(&self, names: &[String]) -> Result<Vec<RawGroup>>;

    /// Fetches exactly one group by name; fails if zero or more than one
    /// group matches.
    async fn get_group(&self, name: &str) -> Result<RawGroup>;

    /// Fetches the VM record for one instance.
    async fn list_instance(&self, instance_id: &str) -> Result<RawEc2Instance>;

    /// Resolves `"$Default"`/`"$Latest"`/a literal version string against a
    /// launch template to a concrete version number.
    async fn resolve_template_version(&self, template_id: &str, version: &str) -> Result<i64>;

    /// Sets a group's desired capacity. Only ever used to increase it; the
    /// controller decreases capacity via `terminate_instance(.., decrement = true)`.
    async fn set_desired_capacity(&self, group_name: &str, desired_capacity: i32) -> Result<()>;

    /// Terminates one instance, optionally decrementing the group's desired
    /// capacity atomically so no replacement launches.
    async fn terminate_instance(&self, instance_id: &str, decrement_capacity: bool) -> Result<()>;

    /// Completes a lifecycle hook with ABANDON or CONTINUE.
    async fn complete_lifecycle_action(
        &self,
        group_name: &str,
        instance_id: &str,
        hook_name: &str,
        result: LifecycleActionResult,
    ) -> Result<()>;

    /// Fetches an instance's user data. Read-only, used by ancillary
    /// operator tooling only; no decider calls this.
    async fn get_user_data(&self, instance_id: &str) -> Result<String>;
}

/// Sleep inserted between `ListGroups` pages to avoid burst-throttling.
pub const LIST_GROUPS_PAGE_SLEEP: Duration = Duration::from_millis(200);

/// Number of attempts made for read-only calls before giving up.
///
/// Supplemented from `original_source/bouncer/runner.go`'s `apiRetryCount`:
/// the spec is silent on read-call retry, but the original tool unambiguously
/// retries reads; mutating calls remain single-shot per the component design.
pub const READ_RETRY_ATTEMPTS: u32 = 10;

/// Sleep between read-call retry attempts.
pub const READ_RETRY_SLEEP: Duration = Duration::from_secs(10);

/// Retries a read-only cloud call up to [`READ_RETRY_ATTEMPTS`] times,
/// sleeping [`READ_RETRY_SLEEP`] between attempts, exactly as
/// `original_source/bouncer/runner.go`'s `retry` helper does for AWS reads.
pub async fn retry_read<T, F, Fut>(operation: &str, mut callback: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut last_err = None;
    for attempt in 0..READ_RETRY_ATTEMPTS {
        match callback().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempt + 1 >= READ_RETRY_ATTEMPTS {
                    last_err = Some(e);
                    break;
                }
                tracing::warn!(operation, attempt, error = %e, "read call failed, retrying");
                tokio::time::sleep(READ_RETRY_SLEEP).await;
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| ControllerError::validation("retry loop ran zero times")))
}

/// Production [`CloudClient`] backed by `aws-sdk-autoscaling` and
/// `aws-sdk-ec2`.
pub struct AwsCloudClient {
    asg: aws_sdk_autoscaling::Client,
    ec2: aws_sdk_ec2::Client,
}

impl AwsCloudClient {
    /// Builds a client from ambient AWS configuration (`AWS_DEFAULT_REGION`,
    /// defaulting to `us-east-1`, and the default credential chain).
    pub async fn from_env() -> Self {
        let region = std::env::var("AWS_DEFAULT_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_autoscaling::config::Region::new(region))
            .load()
            .await;
        Self {
            asg: aws_sdk_autoscaling::Client::new(&config),
            ec2: aws_sdk_ec2::Client::new(&config),
        }
    }

    fn group_from_sdk(g: &aws_sdk_autoscaling::types::AutoScalingGroup) -> RawGroup {
        let instances = g
            .instances()
            .iter()
            .map(|i| RawAsgInstance {
                instance_id: i.instance_id().unwrap_or_default().to_string(),
                lifecycle_state: i.lifecycle_state().map(|s| s.as_str().to_string()).unwrap_or_default(),
                launch_configuration_name: i.launch_configuration_name().map(str::to_string),
                launch_template: i.launch_template().and_then(|lt| {
                    Some(RawLaunchTemplateSpec {
                        id: lt.launch_template_id()?.to_string(),
                        version: lt.version().unwrap_or("$Default").to_string(),
                    })
                }),
            })
            .collect();

        let launch_template = g.launch_template().and_then(|lt| {
            Some(RawLaunchTemplateSpec {
                id: lt.launch_template_id()?.to_string(),
                version: lt.version().unwrap_or("$Default").to_string(),
            })
        });

        RawGroup {
            name: g.auto_scaling_group_name().unwrap_or_default().to_string(),
            desired_capacity: g.desired_capacity().unwrap_or_default(),
            min_size: g.min_size().unwrap_or_default(),
            max_size: g.max_size().unwrap_or_default(),
            launch_configuration_name: g.launch_configuration_name().map(str::to_string),
            launch_template,
            instances,
            tags: g
                .tags()
                .iter()
                .filter_map(|t| Some((t.key()?.to_string(), t.value().unwrap_or_default().to_string())))
                .collect(),
        }
    }
}

#[async_trait]
impl CloudClient for AwsCloudClient {
    async fn list_groups(&self, names: &[String]) -> Result<Vec<RawGroup>> {
        retry_read("listing ASGs", || async {
            let mut groups = Vec::new();
            let mut next_token: Option<String> = None;
            loop {
                let mut req = self.asg.describe_auto_scaling_groups();
                if !names.is_empty() {
                    req = req.set_auto_scaling_group_names(Some(names.to_vec()));
                }
                if let Some(token) = &next_token {
                    req = req.next_token(token.clone());
                }
                let resp = req
                    .send()
                    .await
                    .map_err(|e| ControllerError::cloud("listing ASGs", e))?;
                groups.extend(resp.auto_scaling_groups().iter().map(Self::group_from_sdk));
                next_token = resp.next_token().map(str::to_string);
                if next_token.is_none() {
                    break;
                }
                tokio::time::sleep(LIST_GROUPS_PAGE_SLEEP).await;
            }
            Ok(groups)
        })
        .await
    }

    async fn get_group(&self, name: &str) -> Result<RawGroup> {
        let groups = self.list_groups(std::slice::from_ref(&name.to_string())).await?;
        match groups.len() {
            1 => Ok(groups.into_iter().next().unwrap()),
            n => Err(ControllerError::cloud(
                "describing ASG",
                std::io::Error::other(format!("expected 1 group, got {n}")),
            )),
        }
    }

    async fn list_instance(&self, instance_id: &str) -> Result<RawEc2Instance> {
        retry_read("describing instance", || async {
            let resp = self
                .ec2
                .describe_instances()
                .instance_ids(instance_id)
                .send()
                .await
                .map_err(|e| ControllerError::cloud("describing instance", e))?;
            let inst = resp
                .reservations()
                .iter()
                .flat_map(|r| r.instances())
                .next()
                .ok_or_else(|| {
                    ControllerError::cloud(
                        "describing instance",
                        std::io::Error::other(format!("no instances found for {instance_id}")),
                    )
                })?;
            Ok(RawEc2Instance {
                instance_id: inst.instance_id().unwrap_or(instance_id).to_string(),
                state_name: inst
                    .state()
                    .and_then(|s| s.name())
                    .map(|n| n.as_str().to_string())
                    .unwrap_or_default(),
                launch_time: inst
                    .launch_time()
                    .and_then(|t| DateTime::from_timestamp(t.secs(), 0))
                    .unwrap_or_else(Utc::now),
            })
        })
        .await
    }

    async fn resolve_template_version(&self, template_id: &str, version: &str) -> Result<i64> {
        retry_read("resolving launch template version", || async {
            match version {
                literal if literal != "$Default" && literal != "$Latest" => {
                    literal.parse::<i64>().map_err(|_| {
                        ControllerError::validation(format!(
                            "launch template version {literal:?} is neither $Default, $Latest nor an integer"
                        ))
                    })
                }
                _ => {
                    let resp = self
                        .ec2
                        .describe_launch_templates()
                        .launch_template_ids(template_id)
                        .send()
                        .await
                        .map_err(|e| ControllerError::cloud("describing launch template", e))?;
                    let templates = resp.launch_templates();
                    let template = match templates.len() {
                        1 => &templates[0],
                        n => {
                            return Err(ControllerError::cloud(
                                "describing launch template",
                                std::io::Error::other(format!("expected 1 launch template, got {n}")),
                            ))
                        }
                    };
                    Ok(if version == "$Latest" {
                        template.latest_version_number().unwrap_or_default()
                    } else {
                        template.default_version_number().unwrap_or_default()
                    })
                }
            }
        })
        .await
    }

    async fn set_desired_capacity(&self, group_name: &str, desired_capacity: i32) -> Result<()> {
        self.asg
            .set_desired_capacity()
            .auto_scaling_group_name(group_name)
            .desired_capacity(desired_capacity)
            .send()
            .await
            .map_err(|e| ControllerError::cloud("setting desired capacity", e))?;
        Ok(())
    }

    async fn terminate_instance(&self, instance_id: &str, decrement_capacity: bool) -> Result<()> {
        self.asg
            .terminate_instance_in_auto_scaling_group()
            .instance_id(instance_id)
            .should_decrement_desired_capacity(decrement_capacity)
            .send()
            .await
            .map_err(|e| ControllerError::cloud(format!("terminating instance {instance_id}"), e))?;
        Ok(())
    }

    async fn complete_lifecycle_action(
        &self,
        group_name: &str,
        instance_id: &str,
        hook_name: &str,
        result: LifecycleActionResult,
    ) -> Result<()> {
        self.asg
            .complete_lifecycle_action()
            .auto_scaling_group_name(group_name)
            .instance_id(instance_id)
            .lifecycle_hook_name(hook_name)
            .lifecycle_action_result(result.as_str())
            .send()
            .await
            .map_err(|e| ControllerError::cloud("completing lifecycle action", e))?;
        Ok(())
    }

    async fn get_user_data(&self, instance_id: &str) -> Result<String> {
        let resp = self
            .ec2
            .describe_instance_attribute()
            .instance_id(instance_id)
            .attribute(aws_sdk_ec2::types::InstanceAttributeName::UserData)
            .send()
            .await
            .map_err(|e| ControllerError::cloud("fetching user data", e))?;
        Ok(resp
            .user_data()
            .and_then(|v| v.value())
            .unwrap_or_default()
            .to_string())
    }
}
