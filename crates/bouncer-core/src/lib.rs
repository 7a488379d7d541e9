//! Core data model and instance classifier for the fleet rotation controller.
//!
//! This crate has no I/O and no async: it owns the plain-value types a poll
//! snapshot is built from ([`AsgSnapshot`], [`AsgSet`]), the operator-intent
//! parser ([`DesiredAsg`]), and the pure `is_old`/`is_healthy` classifier
//! ([`instance::classify_old`], [`instance::classify_healthy`]) that every
//! mode decider in `bouncer-controller` is built on top of.

pub mod asg;
pub mod asgset;
pub mod desired_asg;
pub mod error;
pub mod instance;
pub mod lifecycle;

#[cfg(test)]
mod proptest_tests;

pub use asg::{AsgSnapshot, GroupRecord};
pub use asgset::{AsgSet, InstanceRef};
pub use desired_asg::{parse_asg_list, DesiredAsg};
pub use error::{Error, Result};
pub use instance::{classify_healthy, classify_old, InstanceLaunchSpec, InstanceSnapshot, LaunchSpec, OldReason};
pub use lifecycle::{LifecycleClass, LifecycleState};
