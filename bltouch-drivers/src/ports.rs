//! Auxiliary port pool
//!
//! The board registers its spare pins as numbered ports; plugins claim
//! them through [`IoPorts`]. Claims hand out the highest-numbered free
//! port of the requested kind, the same order grblHAL uses when a driver
//! cannot claim explicitly.

use bltouch_hal::{IoPorts, PortDirection, PortKind};
use heapless::{FnvIndexSet, String, Vec};

/// Number of GPIO pins on RP2040
pub const GPIO_COUNT: u8 = 30;

/// Maximum number of registered ports
pub const MAX_PORTS: usize = 16;

/// Maximum stored claim description length
pub const MAX_DESCRIPTION_LEN: usize = 24;

/// Port registration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortError {
    /// Pin number outside the GPIO range
    InvalidPin,
    /// Pin already registered as a port
    PinInUse,
    /// Port table full
    TableFull,
}

impl core::fmt::Display for PortError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            PortError::InvalidPin => "invalid pin",
            PortError::PinInUse => "pin already in use",
            PortError::TableFull => "port table full",
        };
        f.write_str(msg)
    }
}

#[derive(Debug)]
struct PortSlot {
    pin: u8,
    kind: PortKind,
    direction: PortDirection,
    owner: Option<String<MAX_DESCRIPTION_LEN>>,
}

/// Table of claimable ports
#[derive(Debug, Default)]
pub struct PortAllocator {
    ports: Vec<PortSlot, MAX_PORTS>,
    /// Pins that already back a port
    pins: FnvIndexSet<u8, 32>,
}

impl PortAllocator {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pin as the next port number
    pub fn add_port(
        &mut self,
        pin: u8,
        kind: PortKind,
        direction: PortDirection,
    ) -> Result<u8, PortError> {
        if pin >= GPIO_COUNT {
            return Err(PortError::InvalidPin);
        }
        if self.pins.contains(&pin) {
            return Err(PortError::PinInUse);
        }
        let port = self.ports.len() as u8;
        self.ports
            .push(PortSlot {
                pin,
                kind,
                direction,
                owner: None,
            })
            .map_err(|_| PortError::TableFull)?;
        self.pins.insert(pin).map_err(|_| PortError::TableFull)?;
        Ok(port)
    }

    /// GPIO pin behind a port
    pub fn pin(&self, port: u8) -> Option<u8> {
        self.ports.get(port as usize).map(|p| p.pin)
    }

    /// Description given by the claimant, if claimed
    pub fn owner(&self, port: u8) -> Option<&str> {
        self.ports
            .get(port as usize)
            .and_then(|p| p.owner.as_deref())
    }

    /// Check if a port is claimed
    pub fn is_claimed(&self, port: u8) -> bool {
        self.owner(port).is_some()
    }

    /// Return a port to the pool
    pub fn release(&mut self, port: u8) {
        if let Some(p) = self.ports.get_mut(port as usize) {
            p.owner = None;
        }
    }
}

impl IoPorts for PortAllocator {
    fn available(&self, kind: PortKind, direction: PortDirection) -> u8 {
        self.ports
            .iter()
            .filter(|p| p.kind == kind && p.direction == direction && p.owner.is_none())
            .count() as u8
    }

    fn claim(&mut self, kind: PortKind, direction: PortDirection, description: &str) -> Option<u8> {
        let (port, slot) = self
            .ports
            .iter_mut()
            .enumerate()
            .rev()
            .find(|(_, p)| p.kind == kind && p.direction == direction && p.owner.is_none())?;

        let mut owner = String::new();
        for c in description.chars() {
            if owner.push(c).is_err() {
                break;
            }
        }
        slot.owner = Some(owner);

        #[cfg(feature = "defmt")]
        defmt::debug!("port {} (gpio{}) claimed", port, slot.pin);

        Some(port as u8)
    }
}

/// Pin reference parsed from a config string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinSpec {
    /// GPIO number
    pub pin: u8,
    /// Active-low
    pub inverted: bool,
    /// Internal pull-up requested
    pub pull_up: bool,
}

/// Parse a pin string from config
///
/// Supports formats:
/// - "gpio11" -> pin 11
/// - "!gpio12" -> pin 12, inverted (active-low)
/// - "^gpio4" -> pin 4 with pull-up
/// - "!^gpio4" -> both
pub fn parse_pin_string(s: &str) -> Option<PinSpec> {
    let s = s.trim();

    let (s, inverted) = match s.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (s, false),
    };
    let (s, pull_up) = match s.strip_prefix('^') {
        Some(rest) => (rest, true),
        None => (s, false),
    };

    let pin: u8 = s.strip_prefix("gpio")?.parse().ok()?;
    if pin >= GPIO_COUNT {
        return None;
    }

    Some(PinSpec {
        pin,
        inverted,
        pull_up,
    })
}
