//! Error types for the controller crate: cloud client failures, hook
//! failures, timeouts and invariant violations surfaced by mode deciders.

use thiserror::Error;

/// Result type alias using [`ControllerError`] as the error type.
pub type Result<T> = std::result::Result<T, ControllerError>;

/// Errors that can occur while driving a rotation.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// The operator-supplied ASG list or mode flags failed validation.
    #[error("validation failed: {reason}")]
    Validation {
        /// Why the configuration was rejected.
        reason: String,
    },

    /// A data-model parse error from `bouncer-core`.
    #[error(transparent)]
    Core(#[from] bouncer_core::Error),

    /// The cloud SDK returned an error for a read or mutating call.
    #[error("cloud client error during {operation}: {source}")]
    Cloud {
        /// The operation that failed (e.g. "describing ASGs").
        operation: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The pre-terminate hook failed, was killed on timeout, or exited
    /// non-zero.
    #[error("pre-terminate hook failed: {reason}")]
    Hook {
        /// What went wrong running the hook.
        reason: String,
    },

    /// The run's per-action deadline expired while sleeping between polls.
    #[error("timeout exceeded, something is probably wrong with the rollout")]
    Timeout,

    /// A decider hit a branch the data model should make unreachable.
    #[error("invariant violated ({invariant}): {detail}")]
    InvariantViolation {
        /// Name of the violated invariant.
        invariant: String,
        /// The observed counts/state that make it unreachable.
        detail: String,
    },

    /// The governing context was cancelled (operator interrupt).
    #[error("rotation cancelled")]
    Cancelled,
}

impl ControllerError {
    /// Wraps a cloud SDK error with the operation that produced it.
    pub fn cloud(operation: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Cloud {
            operation: operation.into(),
            source: Box::new(source),
        }
    }

    /// Builds a validation error.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation { reason: reason.into() }
    }

    /// Builds an invariant-violation error.
    pub fn invariant(invariant: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::InvariantViolation {
            invariant: invariant.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display() {
        assert_eq!(
            ControllerError::Timeout.to_string(),
            "timeout exceeded, something is probably wrong with the rollout"
        );
    }

    #[test]
    fn validation_display() {
        let err = ControllerError::validation("canary mode supports only 1 ASG at a time");
        assert!(err.to_string().contains("canary mode"));
    }

    #[test]
    fn invariant_display_names_invariant_and_detail() {
        let err = ControllerError::invariant("capacity mismatch", "old=0 new=2 final=3");
        let s = err.to_string();
        assert!(s.contains("capacity mismatch"));
        assert!(s.contains("old=0"));
    }
}
