//! BLTouch command table
//!
//! The BLTouch is driven by a servo signal, and every command it accepts
//! is just a servo angle. The angle is therefore both the actuation value
//! and the command identifier on the wire.
//!
//! Each command needs a minimum settle time before the probe's reported
//! state can be trusted:
//!
//! - 500ms for a reliable Reset
//! - 750ms for Deploy/Stow, otherwise the alarm state is not seen until
//!   the following move command
//! - 150ms for the output mode commands

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Minimum delay applied to every command (ms)
///
/// The probe needs time to recognize any command. Individual commands may
/// require more, never less.
pub const COMMAND_DELAY_MS: u32 = 500;

/// Settle time after Reset (ms)
pub const RESET_DELAY_MS: u32 = 500;

/// Settle time after Deploy (ms)
pub const DEPLOY_DELAY_MS: u32 = 750;

/// Settle time after Stow (ms)
pub const STOW_DELAY_MS: u32 = 750;

/// Settle time after entering software mode (ms)
pub const SW_MODE_DELAY_MS: u32 = COMMAND_DELAY_MS;

/// Settle time after a self-test request (ms)
pub const SELFTEST_DELAY_MS: u32 = COMMAND_DELAY_MS;

/// Settle time after storing the output mode (ms)
pub const MODE_STORE_DELAY_MS: u32 = 150;

/// Settle time after selecting 5V output (ms)
pub const SET_5V_DELAY_MS: u32 = 150;

/// Settle time after selecting open-drain output (ms)
pub const SET_OD_DELAY_MS: u32 = 150;

/// Commands understood by the probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum Command {
    /// Push the pin down
    Deploy = 10,
    /// Enter software (alarm-reporting) mode
    SwMode = 60,
    /// Pull the pin up
    Stow = 90,
    /// Run the probe's built-in self test
    SelfTest = 120,
    /// Persist the selected output mode
    ModeStore = 130,
    /// Select 5V output
    Set5vMode = 140,
    /// Select open-drain output
    SetOdMode = 150,
    /// Clear an alarm
    Reset = 160,
}

impl Command {
    /// Every command, in ascending angle order
    pub const ALL: [Command; 8] = [
        Command::Deploy,
        Command::SwMode,
        Command::Stow,
        Command::SelfTest,
        Command::ModeStore,
        Command::Set5vMode,
        Command::SetOdMode,
        Command::Reset,
    ];

    /// Servo angle in degrees that encodes this command
    pub const fn angle(self) -> u8 {
        self as u8
    }

    /// Minimum settle delay in milliseconds
    pub const fn min_delay_ms(self) -> u32 {
        match self {
            Command::Deploy => DEPLOY_DELAY_MS,
            Command::SwMode => SW_MODE_DELAY_MS,
            Command::Stow => STOW_DELAY_MS,
            Command::SelfTest => SELFTEST_DELAY_MS,
            Command::ModeStore => MODE_STORE_DELAY_MS,
            Command::Set5vMode => SET_5V_DELAY_MS,
            Command::SetOdMode => SET_OD_DELAY_MS,
            Command::Reset => RESET_DELAY_MS,
        }
    }

    /// Look up the command encoded by an angle
    pub fn from_angle(angle: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|cmd| cmd.angle() == angle)
    }

    /// Short uppercase name, as printed in diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            Command::Deploy => "DEPLOY",
            Command::SwMode => "SW-MODE",
            Command::Stow => "STOW",
            Command::SelfTest => "SELFTEST",
            Command::ModeStore => "MODE-STORE",
            Command::Set5vMode => "5V-MODE",
            Command::SetOdMode => "OD-MODE",
            Command::Reset => "RESET",
        }
    }
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Probe output mode selected by the mode commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OutputMode {
    /// Push-pull 5V signal
    #[default]
    FiveVolt,
    /// Open-drain signal (for 3.3V controllers with pull-ups)
    OpenDrain,
}

impl OutputMode {
    /// Command that selects this mode
    pub const fn command(self) -> Command {
        match self {
            OutputMode::FiveVolt => Command::Set5vMode,
            OutputMode::OpenDrain => Command::SetOdMode,
        }
    }
}
