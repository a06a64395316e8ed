//! Trigger latch
//!
//! Written from the edge watcher when the probe fires during a probing
//! move, read by the probe driver. The watcher only ever sets it and the
//! driver only clears it at session configure, so plain loads and stores
//! are enough and this also works on targets without CAS (thumbv6m).

use portable_atomic::{AtomicBool, Ordering};

/// Atomic "probe fired" flag
#[derive(Debug, Default)]
pub struct TriggerLatch {
    fired: AtomicBool,
}

impl TriggerLatch {
    /// Create a cleared latch
    pub const fn new() -> Self {
        Self {
            fired: AtomicBool::new(false),
        }
    }

    /// Record a trigger
    pub fn set(&self) {
        self.fired.store(true, Ordering::Release);
    }

    /// Clear the latch
    pub fn clear(&self) {
        self.fired.store(false, Ordering::Release);
    }

    /// Check whether a trigger has been recorded since the last clear
    pub fn is_set(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}
