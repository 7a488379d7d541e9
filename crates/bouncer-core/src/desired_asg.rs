//! The operator-supplied target for a single autoscaling group.

use crate::error::{Error, Result};

/// What the operator asked for: an ASG by name, and the capacity it should
/// end the rotation at.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DesiredAsg {
    /// Name of the autoscaling group.
    pub name: String,
    /// Capacity the ASG must be at when the rotation finishes.
    pub final_desired_capacity: i32,
    /// Command to run against each instance before it is terminated.
    pub pre_terminate_cmd: Option<String>,
}

impl DesiredAsg {
    /// Parses one `NAME` or `NAME:CAPACITY` entry.
    ///
    /// `default_capacity`, when given, fills in a missing `:CAPACITY` suffix;
    /// without it a bare `NAME` is an error, matching the Go tool's
    /// `ExtractDesiredASG`.
    pub fn parse(
        entry: &str,
        default_capacity: Option<i32>,
        pre_terminate_cmd: Option<String>,
    ) -> Result<Self> {
        let parts: Vec<&str> = entry.split(':').collect();
        let (name, capacity) = match parts.as_slice() {
            [name] => (
                (*name).to_string(),
                default_capacity.ok_or_else(|| Error::MissingCapacity {
                    name: (*name).to_string(),
                })?,
            ),
            [name, cap] => {
                let parsed = cap.parse::<i32>().map_err(|_| Error::InvalidAsgEntry {
                    entry: entry.to_string(),
                    reason: format!("{cap:?} is not a valid integer capacity"),
                })?;
                if parsed < 0 {
                    return Err(Error::InvalidAsgEntry {
                        entry: entry.to_string(),
                        reason: format!("capacity {parsed} must not be negative"),
                    });
                }
                ((*name).to_string(), parsed)
            }
            _ => {
                return Err(Error::InvalidAsgEntry {
                    entry: entry.to_string(),
                    reason: "expected at most one ':' separator".to_string(),
                })
            }
        };

        Ok(Self {
            name,
            final_desired_capacity: capacity,
            pre_terminate_cmd,
        })
    }
}

/// Parses the operator's `--asgs` and `--preterminatecall` flags into a
/// list of [`DesiredAsg`] in the order given.
///
/// `asg_list` is a comma-separated list of `NAME` or `NAME:CAPACITY` entries.
/// `pre_terminate_calls`, if non-empty, must contain exactly one entry per
/// ASG; an empty list means no ASG gets a pre-terminate command.
pub fn parse_asg_list(
    asg_list: &str,
    default_capacity: Option<i32>,
    pre_terminate_calls: &[String],
) -> Result<Vec<DesiredAsg>> {
    let entries: Vec<&str> = asg_list.split(',').map(str::trim).collect();

    if !pre_terminate_calls.is_empty() && pre_terminate_calls.len() != entries.len() {
        return Err(Error::PreTerminateCountMismatch {
            given: pre_terminate_calls.len(),
            expected: entries.len(),
        });
    }

    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let cmd = pre_terminate_calls.get(i).cloned();
            DesiredAsg::parse(entry, default_capacity, cmd)
        })
        .collect()
}
