//! Probe session state
//!
//! Tracks what the last session configure applied, plus the trigger latch
//! shared with the edge watcher.

pub mod latch;

pub use latch::TriggerLatch;

/// Snapshot of the probe session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProbeState {
    /// Latched trigger seen by the edge watcher
    pub triggered: bool,
    /// Effective inversion (`invert_probe_pin` XOR probe-away)
    pub inverted: bool,
    /// A probing move is in progress and the edge interrupt is armed
    pub is_probing: bool,
}
