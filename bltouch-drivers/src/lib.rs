//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in bltouch-hal on top of embedded-hal:
//!
//! - Servo output (PWM hobby servo)
//! - Probe input (shared line + edge watcher)
//! - Housekeeping-aware delay
//! - Auxiliary port pool

#![no_std]
#![deny(unsafe_code)]

pub mod delay;
pub mod ports;
pub mod probe;
pub mod servo;

pub use delay::HousekeepingDelay;
pub use ports::{parse_pin_string, PinSpec, PortAllocator, PortError};
pub use probe::{watch_edges, ProbeHandle, ProbeLine};
pub use servo::{PwmServo, ServoError, MAX_SERVOS};
