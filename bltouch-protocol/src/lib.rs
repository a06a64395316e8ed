//! BLTouch grblHAL plugin surface
//!
//! Host-facing side of the probe driver: M-code handling, probe session
//! hooks and the options report, each chained to whatever was registered
//! before the plugin.
//!
//! ```text
//! line ──► LineBuffer ──► Block::parse ──► check ──► validate ──► execute
//!                                            │           │           │
//!                                            └── BltouchPlugin, then Chain ──┘
//! ```

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod block;
pub mod chain;
pub mod dispatch;
pub mod plugin;
pub mod status;

#[cfg(test)]
mod test_support;

pub use block::{Block, LineBuffer, LineEvent, Words, MAX_LINE_LEN};
pub use chain::{Chain, ChainFull, MachineState, McodeHandler, OptionReporter, ProbeHooks, MAX_CHAIN};
pub use plugin::{BltouchPlugin, M_DEPLOY, M_SERVO, M_STOW, PLUGIN_ID};
pub use status::Status;
