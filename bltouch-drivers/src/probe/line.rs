//! Shared probe line
//!
//! The physical pin is owned by the edge watcher, which mirrors its level
//! here. The probe driver gets a [`ProbeHandle`] that reads the mirror and
//! sets polarity and arming. All fields are single-writer atomics and only
//! load/store is used, so a `static ProbeLine` works on thumbv6m.

use bltouch_core::state::TriggerLatch;
use bltouch_hal::{InputOverride, IrqEdge, ProbeInput};
use portable_atomic::{AtomicBool, AtomicU8, Ordering};

const EDGE_RISING: u8 = 0b01;
const EDGE_FALLING: u8 = 0b10;

fn edge_bits(edge: IrqEdge) -> u8 {
    match edge {
        IrqEdge::None => 0,
        IrqEdge::Rising => EDGE_RISING,
        IrqEdge::Falling => EDGE_FALLING,
        IrqEdge::Both => EDGE_RISING | EDGE_FALLING,
    }
}

fn bits_edge(bits: u8) -> IrqEdge {
    match bits & (EDGE_RISING | EDGE_FALLING) {
        EDGE_RISING => IrqEdge::Rising,
        EDGE_FALLING => IrqEdge::Falling,
        0 => IrqEdge::None,
        _ => IrqEdge::Both,
    }
}

/// Probe line state shared between the edge watcher and the driver
#[derive(Debug, Default)]
pub struct ProbeLine {
    /// Electrical level (written by the watcher)
    level: AtomicBool,
    /// Input override (written by the driver)
    inverted: AtomicBool,
    /// Armed edges as a bit mask (written by the driver)
    armed: AtomicU8,
}

impl ProbeLine {
    /// Create a line reading low, not inverted, nothing armed
    pub const fn new() -> Self {
        Self {
            level: AtomicBool::new(false),
            inverted: AtomicBool::new(false),
            armed: AtomicU8::new(0),
        }
    }

    /// Handle implementing [`ProbeInput`] for the driver
    pub fn handle(&self) -> ProbeHandle<'_> {
        ProbeHandle { line: self }
    }

    /// Electrical level last seen
    pub fn level(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }

    /// Edges currently armed
    pub fn armed_edge(&self) -> IrqEdge {
        bits_edge(self.armed.load(Ordering::Acquire))
    }

    /// Record the level without evaluating edges
    pub fn seed_level(&self, high: bool) {
        self.level.store(high, Ordering::Release);
    }

    /// Record a new electrical level and latch a trigger on an armed edge
    ///
    /// Returns `true` if the latch was set.
    pub fn update_level(&self, high: bool, latch: &TriggerLatch) -> bool {
        let prev = self.level.load(Ordering::Acquire);
        self.level.store(high, Ordering::Release);

        let edge = self.armed_edge();
        let fired = match (prev, high) {
            (false, true) => edge.fires_on_rising(),
            (true, false) => edge.fires_on_falling(),
            _ => false,
        };
        if fired {
            latch.set();
        }
        fired
    }
}

/// Driver-side view of a [`ProbeLine`]
#[derive(Debug, Clone, Copy)]
pub struct ProbeHandle<'a> {
    line: &'a ProbeLine,
}

impl ProbeInput for ProbeHandle<'_> {
    fn is_active(&mut self) -> bool {
        self.line.level() ^ self.line.inverted.load(Ordering::Acquire)
    }

    fn set_input_override(&mut self, mode: InputOverride) {
        self.line.inverted.store(mode.is_inverted(), Ordering::Release);
    }

    fn set_interrupt(&mut self, edge: IrqEdge, enabled: bool) {
        let current = self.line.armed.load(Ordering::Acquire);
        let bits = if enabled {
            edge_bits(edge)
        } else {
            current & !edge_bits(edge)
        };
        self.line.armed.store(bits, Ordering::Release);
    }
}
