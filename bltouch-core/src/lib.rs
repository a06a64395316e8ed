//! Board-agnostic core logic for the BLTouch probe
//!
//! This crate contains everything that does not depend on a specific
//! board:
//!
//! - Command table (servo angle and settle time per probe command)
//! - Probe driver with alarm recovery and session configure
//! - Trigger latch shared with the edge watcher
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod command;
pub mod config;
pub mod diag;
pub mod driver;
pub mod error;
pub mod state;

pub use command::{Command, OutputMode};
pub use config::{BltouchConfig, ServoConfig};
pub use driver::ProbeDriver;
pub use error::{ConfigError, ProbeError};
pub use state::{ProbeState, TriggerLatch};
