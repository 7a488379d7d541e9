//! Autoscaling lifecycle states and the coarse classes deciders reason about.

use std::fmt;

/// The lifecycle state an autoscaling instance reports.
///
/// Covers the fixed set of states an ASG emits plus an `Other` catch-all for
/// anything the cloud adds later (e.g. `Warmed:*` warm-pool states), which is
/// treated as transient-immutable so a new state never causes a decider to
/// act on an instance it doesn't understand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LifecycleState {
    /// Instance is launching.
    Pending,
    /// Instance is launching and a pending lifecycle hook is attached.
    PendingWait,
    /// The pending lifecycle hook has been told to proceed.
    PendingProceed,
    /// Instance is in service and healthy from the ASG's perspective.
    InService,
    /// Instance has been told to terminate.
    Terminating,
    /// Instance is terminating and a terminate lifecycle hook is attached.
    TerminatingWait,
    /// The terminate lifecycle hook has been told to proceed.
    TerminatingProceed,
    /// Instance has finished terminating.
    Terminated,
    /// Instance is being moved to standby.
    Detaching,
    /// Instance has been detached from the group.
    Detached,
    /// Instance is entering standby.
    EnteringStandby,
    /// Instance is parked in standby.
    Standby,
    /// Instance launch failed health checks and was quarantined.
    Quarantined,
    /// Any lifecycle string not covered above (e.g. warm-pool `Warmed:*`).
    Other(String),
}

impl LifecycleState {
    /// Parses the exact textual state an ASG reports for an instance.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Pending" => Self::Pending,
            "Pending:Wait" => Self::PendingWait,
            "Pending:Proceed" => Self::PendingProceed,
            "InService" => Self::InService,
            "Terminating" => Self::Terminating,
            "Terminating:Wait" => Self::TerminatingWait,
            "Terminating:Proceed" => Self::TerminatingProceed,
            "Terminated" => Self::Terminated,
            "Detaching" => Self::Detaching,
            "Detached" => Self::Detached,
            "EnteringStandby" => Self::EnteringStandby,
            "Standby" => Self::Standby,
            "Quarantined" => Self::Quarantined,
            other => Self::Other(other.to_string()),
        }
    }

    /// True if this instance is in any `Terminating*` state.
    #[must_use]
    pub const fn is_terminating(&self) -> bool {
        matches!(
            self,
            Self::Terminating | Self::TerminatingWait | Self::TerminatingProceed
        )
    }

    /// True for the states an autoscaling action cannot target (the instance
    /// is already mid-transition away from the group).
    #[must_use]
    pub const fn is_immutable(&self) -> bool {
        matches!(self, Self::Terminating | Self::Pending | Self::TerminatingProceed)
    }

    /// Coarse class used by deciders and by `AsgSet::is_transient`.
    #[must_use]
    pub const fn class(&self) -> LifecycleClass {
        match self {
            Self::InService | Self::Standby | Self::Quarantined => LifecycleClass::Stable,
            Self::PendingWait | Self::TerminatingWait => LifecycleClass::TransientMutable,
            Self::Pending
            | Self::Terminating
            | Self::PendingProceed
            | Self::TerminatingProceed
            | Self::Detaching
            | Self::EnteringStandby => LifecycleClass::TransientImmutable,
            Self::Terminated | Self::Detached => LifecycleClass::TerminalForInstance,
            Self::Other(_) => LifecycleClass::TransientImmutable,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "Pending",
            Self::PendingWait => "Pending:Wait",
            Self::PendingProceed => "Pending:Proceed",
            Self::InService => "InService",
            Self::Terminating => "Terminating",
            Self::TerminatingWait => "Terminating:Wait",
            Self::TerminatingProceed => "Terminating:Proceed",
            Self::Terminated => "Terminated",
            Self::Detaching => "Detaching",
            Self::Detached => "Detached",
            Self::EnteringStandby => "EnteringStandby",
            Self::Standby => "Standby",
            Self::Quarantined => "Quarantined",
            Self::Other(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

/// Coarse classification of a [`LifecycleState`], used by the predicates in
/// [`crate::asgset::AsgSet`] rather than matching on the raw state directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LifecycleClass {
    /// Settled state; a decider may act on (or ignore) the instance freely.
    Stable,
    /// A hook is attached and waiting; a lifecycle-hook-aware kill can still
    /// target this instance (it routes to `CompleteLifecycleAction`).
    TransientMutable,
    /// Mid-transition and not safely actionable; deciders must wait.
    TransientImmutable,
    /// The instance is gone or going; excluded from all counts.
    TerminalForInstance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_states() {
        assert_eq!(LifecycleState::parse("InService"), LifecycleState::InService);
        assert_eq!(
            LifecycleState::parse("Terminating:Wait"),
            LifecycleState::TerminatingWait
        );
    }

    #[test]
    fn unknown_state_is_other_and_transient_immutable() {
        let s = LifecycleState::parse("Warmed:Pending");
        assert_eq!(s, LifecycleState::Other("Warmed:Pending".to_string()));
        assert_eq!(s.class(), LifecycleClass::TransientImmutable);
    }

    #[test]
    fn display_round_trips_known_states() {
        for raw in [
            "Pending",
            "Pending:Wait",
            "Pending:Proceed",
            "InService",
            "Terminating",
            "Terminating:Wait",
            "Terminating:Proceed",
            "Terminated",
            "Detaching",
            "Detached",
            "EnteringStandby",
            "Standby",
            "Quarantined",
        ] {
            assert_eq!(LifecycleState::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn immutable_states() {
        assert!(LifecycleState::Pending.is_immutable());
        assert!(LifecycleState::Terminating.is_immutable());
        assert!(LifecycleState::TerminatingProceed.is_immutable());
        assert!(!LifecycleState::InService.is_immutable());
        assert!(!LifecycleState::PendingWait.is_immutable());
    }

    #[test]
    fn terminating_prefix() {
        assert!(LifecycleState::Terminating.is_terminating());
        assert!(LifecycleState::TerminatingWait.is_terminating());
        assert!(LifecycleState::TerminatingProceed.is_terminating());
        assert!(!LifecycleState::Pending.is_terminating());
    }
}
