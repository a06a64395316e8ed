//! Handler chains
//!
//! A plugin that takes over a host hook keeps the handlers that were
//! registered before it in a [`Chain`] and forwards to them, so plugins
//! compose instead of replacing each other. The first entry is the nearest
//! previous handler.

use bltouch_hal::LogSink;
use heapless::Vec;

use crate::block::Block;
use crate::status::Status;

/// Maximum handlers per chain
pub const MAX_CHAIN: usize = 4;

/// Host machine state, as far as M-code execution cares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MachineState {
    #[default]
    Idle,
    /// Program running
    Cycle,
    /// Feed hold
    Hold,
    /// Parse and validate only, no motion or output changes
    CheckMode,
    /// Locked after an alarm
    Alarm,
}

/// User M-code handler
pub trait McodeHandler {
    /// Check whether this handler takes an M-code
    fn check(&mut self, mcode: u16) -> bool;

    /// Validate a block; [`Status::Unhandled`] if not ours
    fn validate(&mut self, block: &Block) -> Status;

    /// Execute a validated block; `false` if not ours
    fn execute(&mut self, state: MachineState, block: &Block) -> bool;
}

/// Probe lifecycle hooks
///
/// Every method has a pass-through default so a plugin only implements
/// the hooks it cares about.
pub trait ProbeHooks {
    /// A probing move is about to start; `false` aborts it
    fn on_probe_start(&mut self, _is_probe_away: bool) -> bool {
        true
    }

    /// A probing move finished
    fn on_probe_completed(&mut self) {}

    /// The probe was deployed on request
    fn on_probe_deploy(&mut self) {}

    /// The probe was stowed on request
    fn on_probe_stow(&mut self) {}
}

/// Contributor to the `$I` options report
pub trait OptionReporter {
    /// Append report lines; `newopt` selects the compact option list
    fn report_options(&mut self, newopt: bool, out: &mut dyn LogSink);
}

/// Chain is full
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChainFull;

/// Ordered list of previously registered handlers
pub struct Chain<'a, T: ?Sized, const N: usize = MAX_CHAIN> {
    handlers: Vec<&'a mut T, N>,
}

impl<'a, T: ?Sized, const N: usize> Default for Chain<'a, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: ?Sized, const N: usize> Chain<'a, T, N> {
    /// Create an empty chain
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Append a handler behind the ones already present
    pub fn push(&mut self, handler: &'a mut T) -> Result<(), ChainFull> {
        self.handlers.push(handler).map_err(|_| ChainFull)
    }

    /// Number of handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check for no handlers
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handlers in forwarding order
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, &'a mut T> {
        self.handlers.iter_mut()
    }
}

impl<'a, 'h, const N: usize> Chain<'a, dyn McodeHandler + 'h, N> {
    /// Check whether any handler takes the M-code
    pub fn check(&mut self, mcode: u16) -> bool {
        self.iter_mut().any(|h| h.check(mcode))
    }

    /// First answer other than [`Status::Unhandled`]
    pub fn validate(&mut self, block: &Block) -> Status {
        for h in self.iter_mut() {
            let status = h.validate(block);
            if status != Status::Unhandled {
                return status;
            }
        }
        Status::Unhandled
    }

    /// Execute with the first handler that takes the block
    pub fn execute(&mut self, state: MachineState, block: &Block) -> bool {
        self.iter_mut().any(|h| h.execute(state, block))
    }
}

impl<'a, 'h, const N: usize> Chain<'a, dyn ProbeHooks + 'h, N> {
    /// Start hook on every handler; `false` as soon as one refuses
    pub fn on_probe_start(&mut self, is_probe_away: bool) -> bool {
        self.iter_mut().all(|h| h.on_probe_start(is_probe_away))
    }

    pub fn on_probe_completed(&mut self) {
        self.iter_mut().for_each(|h| h.on_probe_completed());
    }

    pub fn on_probe_deploy(&mut self) {
        self.iter_mut().for_each(|h| h.on_probe_deploy());
    }

    pub fn on_probe_stow(&mut self) {
        self.iter_mut().for_each(|h| h.on_probe_stow());
    }
}

impl<'a, 'h, const N: usize> Chain<'a, dyn OptionReporter + 'h, N> {
    /// Let every reporter append its lines, in order
    pub fn report_options(&mut self, newopt: bool, out: &mut dyn LogSink) {
        for h in self.iter_mut() {
            h.report_options(newopt, out);
        }
    }
}
