//! Error types for `bouncer-core` data-model and parsing operations.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing or validating the fleet data model.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// An `ASG[:capacity]` entry could not be parsed.
    #[error("invalid ASG entry {entry:?}: {reason}")]
    InvalidAsgEntry {
        /// The raw entry as given on the command line.
        entry: String,
        /// Why the entry was rejected.
        reason: String,
    },

    /// A capacity value was missing and no default was supplied.
    #[error("ASG {name:?} has no capacity and no default capacity was given")]
    MissingCapacity {
        /// Name of the ASG missing a capacity.
        name: String,
    },

    /// The number of pre-terminate commands did not match the number of ASGs.
    #[error(
        "{given} pre-terminate command(s) given for {expected} ASG(s); counts must match or one list must be empty"
    )]
    PreTerminateCountMismatch {
        /// Number of pre-terminate commands supplied.
        given: usize,
        /// Number of ASGs supplied.
        expected: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_entry_display() {
        let err = Error::InvalidAsgEntry {
            entry: "a:b:c".to_string(),
            reason: "too many ':' separated parts".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid ASG entry \"a:b:c\": too many ':' separated parts"
        );
    }

    #[test]
    fn missing_capacity_display() {
        let err = Error::MissingCapacity {
            name: "web-asg".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "ASG \"web-asg\" has no capacity and no default capacity was given"
        );
    }

    #[test]
    fn preterminate_mismatch_display() {
        let err = Error::PreTerminateCountMismatch {
            given: 2,
            expected: 3,
        };
        assert_eq!(
            err.to_string(),
            "2 pre-terminate command(s) given for 3 ASG(s); counts must match or one list must be empty"
        );
    }
}
