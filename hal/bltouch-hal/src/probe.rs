//! Probe signal abstractions
//!
//! The probe input is a digital line with two extra knobs the probe driver
//! needs: an input override that swaps which level counts as "active", and
//! edge-interrupt arming so a touch during motion is latched without
//! polling.

/// Input override applied to the probe line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputOverride {
    /// Active level is electrical high
    #[default]
    Normal,
    /// Active level is electrical low
    Inverted,
}

impl InputOverride {
    /// Build from an inversion flag
    pub const fn from_inverted(inverted: bool) -> Self {
        if inverted {
            InputOverride::Inverted
        } else {
            InputOverride::Normal
        }
    }

    /// Check if this override inverts the line
    pub const fn is_inverted(self) -> bool {
        matches!(self, InputOverride::Inverted)
    }
}

/// Edge selection for the probe interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqEdge {
    /// No edge
    #[default]
    None,
    /// Low to high transition
    Rising,
    /// High to low transition
    Falling,
    /// Either transition
    Both,
}

impl IrqEdge {
    /// Check whether a rising transition fires under this selection
    pub const fn fires_on_rising(self) -> bool {
        matches!(self, IrqEdge::Rising | IrqEdge::Both)
    }

    /// Check whether a falling transition fires under this selection
    pub const fn fires_on_falling(self) -> bool {
        matches!(self, IrqEdge::Falling | IrqEdge::Both)
    }
}

/// Probe input line
///
/// Implementations must not suspend in any of these methods. The probe
/// driver relies on polarity and arming being applied back to back.
pub trait ProbeInput {
    /// Read the line with the current input override applied
    ///
    /// `true` means the probe reports triggered (or alarm, depending on
    /// the command that was last issued).
    fn is_active(&mut self) -> bool;

    /// Set the input override
    fn set_input_override(&mut self, mode: InputOverride);

    /// Enable or disable the edge interrupt
    ///
    /// `set_interrupt(IrqEdge::Both, false)` disarms every edge.
    fn set_interrupt(&mut self, edge: IrqEdge, enabled: bool);
}

impl<T: ProbeInput + ?Sized> ProbeInput for &mut T {
    fn is_active(&mut self) -> bool {
        (**self).is_active()
    }

    fn set_input_override(&mut self, mode: InputOverride) {
        (**self).set_input_override(mode)
    }

    fn set_interrupt(&mut self, edge: IrqEdge, enabled: bool) {
        (**self).set_interrupt(edge, enabled)
    }
}
