//! One autoscaling group within one poll: its group record plus the
//! classified instances it currently holds.

use std::collections::HashMap;

use crate::desired_asg::DesiredAsg;
use crate::instance::{InstanceSnapshot, LaunchSpec};

/// The cloud's record for one ASG, independent of any particular instance.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GroupRecord {
    /// Name of the autoscaling group.
    pub name: String,
    /// Current desired capacity.
    pub desired_capacity: i32,
    /// Minimum size.
    pub min_size: i32,
    /// Maximum size.
    pub max_size: i32,
    /// The launch spec new instances in this group are currently built from.
    pub current_launch_spec: LaunchSpec,
    /// Free-form tags, looked up case-insensitively; ancillary to logging/UI.
    tags: HashMap<String, String>,
}

impl GroupRecord {
    /// Builds a group record with no tags.
    #[must_use]
    pub fn new(
        name: String,
        desired_capacity: i32,
        min_size: i32,
        max_size: i32,
        current_launch_spec: LaunchSpec,
    ) -> Self {
        Self {
            name,
            desired_capacity,
            min_size,
            max_size,
            current_launch_spec,
            tags: HashMap::new(),
        }
    }

    /// Attaches tags, normalizing keys to lowercase for case-insensitive
    /// lookup via [`GroupRecord::tag`].
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = (String, String)>) -> Self {
        self.tags = tags
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        self
    }

    /// Looks up a tag value, ignoring the case of `key`.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(&key.to_lowercase()).map(String::as_str)
    }
}

/// One ASG within one poll: its group record, the classified instances it
/// currently holds, and the operator's target for it.
///
/// Instances hold no back-pointer to this struct; callers needing the group
/// alongside an instance pass both explicitly, which keeps `AsgSnapshot`
/// a plain, cheaply-cloneable value with no cycles.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AsgSnapshot {
    /// The operator's target for this group.
    pub desired: DesiredAsg,
    /// The group's current record.
    pub group: GroupRecord,
    /// The group's instances, in the order the cloud returned them.
    pub instances: Vec<InstanceSnapshot>,
}

impl AsgSnapshot {
    /// `true` if the group's reported instance count doesn't match its own
    /// desired capacity (cloud-side bookkeeping hasn't settled yet).
    #[must_use]
    pub fn has_actual_count_mismatch(&self) -> bool {
        self.group.desired_capacity != i32::try_from(self.instances.len()).unwrap_or(i32::MAX)
    }

    /// `true` if the group's desired capacity has drifted from the
    /// operator's target.
    #[must_use]
    pub fn is_diverged(&self) -> bool {
        self.group.desired_capacity != self.desired.final_desired_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> GroupRecord {
        GroupRecord::new(
            "svc-a".to_string(),
            3,
            1,
            5,
            LaunchSpec::LaunchConfiguration("lc-v2".to_string()),
        )
    }

    #[test]
    fn tag_lookup_is_case_insensitive() {
        let g = group().with_tags([("Team".to_string(), "platform".to_string())]);
        assert_eq!(g.tag("team"), Some("platform"));
        assert_eq!(g.tag("TEAM"), Some("platform"));
        assert_eq!(g.tag("missing"), None);
    }

    #[test]
    fn diverged_when_desired_differs_from_target() {
        let snap = AsgSnapshot {
            desired: DesiredAsg {
                name: "svc-a".to_string(),
                final_desired_capacity: 4,
                pre_terminate_cmd: None,
            },
            group: group(),
            instances: Vec::new(),
        };
        assert!(snap.is_diverged());
    }

    #[test]
    fn count_mismatch_when_instance_list_shorter_than_desired() {
        let snap = AsgSnapshot {
            desired: DesiredAsg {
                name: "svc-a".to_string(),
                final_desired_capacity: 3,
                pre_terminate_cmd: None,
            },
            group: group(),
            instances: Vec::new(),
        };
        assert!(snap.has_actual_count_mismatch());
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let snap = AsgSnapshot {
            desired: DesiredAsg {
                name: "svc-a".to_string(),
                final_desired_capacity: 3,
                pre_terminate_cmd: None,
            },
            group: group().with_tags([("team".to_string(), "platform".to_string())]),
            instances: Vec::new(),
        };
        let json = serde_json::to_string(&snap).unwrap();
        let round_tripped: AsgSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(snap, round_tripped);
    }
}
