//! BLTouch Hardware Abstraction Layer
//!
//! This crate defines the narrow interfaces the probe plugin consumes from
//! its host controller. Chip-specific adapters live in `bltouch-drivers`
//! and in the firmware crate; the probe logic in `bltouch-core` only ever
//! sees these traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  bltouch-protocol (M-codes, hooks)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  bltouch-core (probe driver)            │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  bltouch-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ bltouch-      │       │ bltouch-      │
//! │   drivers     │       │   firmware    │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`servo::ServoOutput`] - Angle-commanded servo channels
//! - [`probe::ProbeInput`] - Probe signal with polarity override and edge arming
//! - [`ioport::IoPorts`] - Claiming auxiliary output ports
//! - [`stream::LogSink`] - Line-oriented diagnostic output
//! - [`stream::Housekeeping`] - Host work serviced while a delay is pending
//!
//! Delays use `embedded_hal_async::delay::DelayNs` directly.

#![no_std]
#![deny(unsafe_code)]

pub mod ioport;
pub mod probe;
pub mod servo;
pub mod stream;

// Re-export key traits at crate root for convenience
pub use ioport::{IoPorts, PortDirection, PortKind};
pub use probe::{InputOverride, IrqEdge, ProbeInput};
pub use servo::{ServoOutput, MAX_ANGLE, MIN_ANGLE};
pub use stream::{Housekeeping, LogSink};
