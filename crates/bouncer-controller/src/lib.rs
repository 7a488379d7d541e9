//! Cloud client, shared rotation actions, and the seven mode deciders for
//! the fleet rotation controller.
//!
//! This crate has all the I/O: [`cloud::CloudClient`] is the seam to the
//! cloud SDK, [`controller::Controller`] owns the actions every mode shares
//! (kill an instance, grow desired capacity, sleep between polls, rebuild a
//! snapshot), and [`modes`] holds one pure decider per rotation strategy.
//! `bouncer-core` supplies the plain-value data model everything here is
//! built from.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod cloud;
pub mod controller;
pub mod error;
pub mod hook;
pub mod modes;
pub mod snapshot;

pub use cloud::{AwsCloudClient, CloudClient, LifecycleActionResult, RawAsgInstance, RawEc2Instance, RawGroup, RawLaunchTemplateSpec};
pub use controller::{
    ActionOutcome, CancelSignal, Controller, ControllerOptions, RotationOutcome, spawn_cancellation_listener,
};
pub use error::{ControllerError, Result};
