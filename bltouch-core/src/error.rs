//! Error types

use crate::command::Command;

/// Probe driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbeError {
    /// The probe still reported an alarm after the recovery retry
    ///
    /// Carries the command that kept failing. The probe is left at that
    /// command's angle.
    AlarmPersisted(Command),
}

impl core::fmt::Display for ProbeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProbeError::AlarmPersisted(cmd) => write!(f, "alarm persisted after {}", cmd),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// PWM frequency is zero
    ZeroFrequency,
    /// Minimum pulse width is not below the maximum
    PulseRange,
    /// Pulse width does not fit in one PWM period
    PulseExceedsPeriod,
    /// Minimum angle is not below the maximum, or outside 0..=180
    AngleRange,
    /// Angle range does not cover every probe command angle
    CommandAngles,
    /// A settle delay is zero or unreasonably long
    DelayOutOfRange,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            ConfigError::ZeroFrequency => "PWM frequency must be non-zero",
            ConfigError::PulseRange => "min pulse must be below max pulse",
            ConfigError::PulseExceedsPeriod => "max pulse exceeds PWM period",
            ConfigError::AngleRange => "invalid servo angle range",
            ConfigError::CommandAngles => "servo angle range excludes probe command angles",
            ConfigError::DelayOutOfRange => "settle delay out of range",
        };
        f.write_str(msg)
    }
}
