//! Configuration type definitions

use crate::command::{Command, OutputMode, COMMAND_DELAY_MS, SW_MODE_DELAY_MS};
use crate::error::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shortest pulse a hobby servo accepts (µs), maps to 0°
pub const DEFAULT_MIN_PULSE_US: u16 = 544;

/// Longest pulse a hobby servo accepts (µs), maps to 180°
pub const DEFAULT_MAX_PULSE_US: u16 = 2400;

/// Servo PWM frequency (Hz)
pub const DEFAULT_PWM_FREQ_HZ: u16 = 50;

/// Upper bound for any configured settle delay (ms)
pub const MAX_SETTLE_DELAY_MS: u32 = 10_000;

/// Servo output configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServoConfig {
    /// Pulse width at `min_angle` (µs)
    pub min_pulse_us: u16,
    /// Pulse width at `max_angle` (µs)
    pub max_pulse_us: u16,
    /// PWM frequency (Hz)
    pub pwm_freq_hz: u16,
    /// Lowest angle (degrees)
    pub min_angle: f32,
    /// Highest angle (degrees)
    pub max_angle: f32,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            min_pulse_us: DEFAULT_MIN_PULSE_US,
            max_pulse_us: DEFAULT_MAX_PULSE_US,
            pwm_freq_hz: DEFAULT_PWM_FREQ_HZ,
            min_angle: bltouch_hal::MIN_ANGLE,
            max_angle: bltouch_hal::MAX_ANGLE,
        }
    }
}

impl ServoConfig {
    /// PWM period in microseconds
    pub fn period_us(&self) -> u32 {
        if self.pwm_freq_hz == 0 {
            return 0;
        }
        1_000_000 / self.pwm_freq_hz as u32
    }

    /// Pulse width in microseconds for an angle
    ///
    /// The angle is clamped to the configured range first.
    pub fn pulse_us(&self, degrees: f32) -> f32 {
        let span = self.max_angle - self.min_angle;
        let clamped = self.clamp_angle(degrees);
        let frac = if span > 0.0 { (clamped - self.min_angle) / span } else { 0.0 };
        let min = self.min_pulse_us as f32;
        let max = self.max_pulse_us as f32;
        min + frac * (max - min)
    }

    /// Clamp an angle to the configured range
    ///
    /// NaN maps to `min_angle`.
    pub fn clamp_angle(&self, degrees: f32) -> f32 {
        if degrees.is_nan() || degrees < self.min_angle {
            self.min_angle
        } else if degrees > self.max_angle {
            self.max_angle
        } else {
            degrees
        }
    }

    /// Check the configuration for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pwm_freq_hz == 0 {
            return Err(ConfigError::ZeroFrequency);
        }
        if self.min_pulse_us >= self.max_pulse_us {
            return Err(ConfigError::PulseRange);
        }
        if self.max_pulse_us as u32 > self.period_us() {
            return Err(ConfigError::PulseExceedsPeriod);
        }
        let angles_ok = self.min_angle >= bltouch_hal::MIN_ANGLE
            && self.max_angle <= bltouch_hal::MAX_ANGLE
            && self.min_angle < self.max_angle;
        if !angles_ok {
            return Err(ConfigError::AngleRange);
        }
        // A clamped command angle would become a different command
        let covers_commands = Command::ALL.iter().all(|cmd| {
            let angle = cmd.angle() as f32;
            angle >= self.min_angle && angle <= self.max_angle
        });
        if !covers_commands {
            return Err(ConfigError::CommandAngles);
        }
        Ok(())
    }
}

/// Probe driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BltouchConfig {
    /// Persistent probe pin inversion
    ///
    /// XOR-ed with the probing direction on every session configure.
    pub invert_probe_pin: bool,
    /// Floor applied to every command's settle delay (ms)
    pub command_delay_ms: u32,
    /// Settle delay for the software-mode command (ms)
    pub sw_mode_delay_ms: u32,
    /// Trigger reading that means "alarm" right after a deploy
    pub deploy_alarm_level: bool,
    /// Trigger reading that means "alarm" right after a stow
    pub stow_alarm_level: bool,
    /// Output mode used by the mode-set command
    pub output_mode: OutputMode,
}

impl Default for BltouchConfig {
    fn default() -> Self {
        Self {
            invert_probe_pin: false,
            command_delay_ms: COMMAND_DELAY_MS,
            sw_mode_delay_ms: SW_MODE_DELAY_MS,
            deploy_alarm_level: true,
            stow_alarm_level: true,
            output_mode: OutputMode::FiveVolt,
        }
    }
}

impl BltouchConfig {
    /// Check the configuration for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_range = |ms: u32| ms > 0 && ms <= MAX_SETTLE_DELAY_MS;
        if !in_range(self.command_delay_ms) || !in_range(self.sw_mode_delay_ms) {
            return Err(ConfigError::DelayOutOfRange);
        }
        Ok(())
    }
}
