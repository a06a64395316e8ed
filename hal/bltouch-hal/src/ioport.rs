//! Auxiliary I/O port claiming
//!
//! Host controllers expose a pool of spare ports that plugins claim at
//! init. A claimed port is exclusively owned by the claimant for the life
//! of the process.

/// Port signal type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortKind {
    /// On/off port
    Digital,
    /// PWM or DAC port
    Analog,
}

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortDirection {
    Input,
    Output,
}

/// Pool of claimable auxiliary ports
pub trait IoPorts {
    /// Number of unclaimed ports of the given kind and direction
    fn available(&self, kind: PortKind, direction: PortDirection) -> u8;

    /// Claim a port
    ///
    /// Returns the claimed port number, or `None` if no port of that kind
    /// is free. `description` is shown by the host's port report.
    fn claim(&mut self, kind: PortKind, direction: PortDirection, description: &str)
        -> Option<u8>;
}
