//! Probe input drivers
//!
//! - Shared probe line: level mirror, polarity and edge arming
//! - Edge watcher task body that feeds the line and the trigger latch

pub mod line;
pub mod watch;

pub use line::{ProbeHandle, ProbeLine};
pub use watch::watch_edges;
