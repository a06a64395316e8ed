//! Simple TOML parser for the probe configuration
//!
//! Handles only the subset `bltouch.toml` uses. It does NOT support the
//! full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - [section] headers
//! - Comments (# ...)
//!
//! Unknown sections and keys are skipped.

use bltouch_core::config::{BltouchConfig, ServoConfig};
use bltouch_core::{ConfigError, OutputMode};
use bltouch_drivers::{parse_pin_string, PinSpec};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Malformed section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Invalid pin string
    InvalidPin,
    /// Values are individually fine but inconsistent
    Config(ConfigError),
}

impl From<ConfigError> for ParseError {
    fn from(e: ConfigError) -> Self {
        ParseError::Config(e)
    }
}

/// Board-level configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirmwareConfig {
    pub servo: ServoConfig,
    pub bltouch: BltouchConfig,
    /// Probe signal input
    pub probe_pin: PinSpec,
    /// Servo channel carrying the probe command signal
    pub servo_channel: u8,
    /// Send the output mode command at boot
    pub apply_output_mode: bool,
    /// Host UART baud rate
    pub baud_rate: u32,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self {
            servo: ServoConfig::default(),
            bltouch: BltouchConfig::default(),
            probe_pin: PinSpec {
                pin: 22,
                inverted: false,
                pull_up: true,
            },
            servo_channel: 1,
            apply_output_mode: false,
            baud_rate: 115_200,
        }
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Servo,
    Bltouch,
    Host,
    Unknown,
}

/// Parse TOML configuration into a [`FirmwareConfig`]
pub fn parse_config(input: &str) -> Result<FirmwareConfig, ParseError> {
    let mut config = FirmwareConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            section = parse_section_header(line)?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(&mut config, section, key, value)?;
        }
    }

    config.bltouch.invert_probe_pin = config.probe_pin.inverted;
    config.servo.validate()?;
    config.bltouch.validate()?;
    Ok(config)
}

fn parse_section_header(line: &str) -> Result<Section, ParseError> {
    let name = line
        .strip_prefix('[')
        .and_then(|l| l.strip_suffix(']'))
        .ok_or(ParseError::InvalidSection)?
        .trim();

    Ok(match name {
        "servo" => Section::Servo,
        "bltouch" => Section::Bltouch,
        "host" => Section::Host,
        "" => return Err(ParseError::InvalidSection),
        _ => Section::Unknown,
    })
}

/// Split `key = value`, dropping an inline comment
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = match value.find('#') {
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn parse_string(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_output_mode(value: &str) -> Result<OutputMode, ParseError> {
    match parse_string(value) {
        "5v" => Ok(OutputMode::FiveVolt),
        "od" => Ok(OutputMode::OpenDrain),
        _ => Err(ParseError::InvalidValue),
    }
}

fn apply_value(
    config: &mut FirmwareConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    match section {
        Section::Servo => match key {
            "pwm_freq_hz" => config.servo.pwm_freq_hz = parse_int(value)?,
            "min_pulse_us" => config.servo.min_pulse_us = parse_int(value)?,
            "max_pulse_us" => config.servo.max_pulse_us = parse_int(value)?,
            _ => {}
        },
        Section::Bltouch => {
            let b = &mut config.bltouch;
            match key {
                "probe_pin" => {
                    config.probe_pin =
                        parse_pin_string(parse_string(value)).ok_or(ParseError::InvalidPin)?;
                }
                "servo_channel" => config.servo_channel = parse_int(value)?,
                "command_delay_ms" => b.command_delay_ms = parse_int(value)?,
                "sw_mode_delay_ms" => b.sw_mode_delay_ms = parse_int(value)?,
                "deploy_alarm_level" => b.deploy_alarm_level = parse_bool(value)?,
                "stow_alarm_level" => b.stow_alarm_level = parse_bool(value)?,
                "output_mode" => b.output_mode = parse_output_mode(value)?,
                "apply_output_mode" => config.apply_output_mode = parse_bool(value)?,
                _ => {}
            }
        }
        Section::Host => {
            if key == "baud_rate" {
                config.baud_rate = parse_int(value)?;
            }
        }
        Section::Root | Section::Unknown => {}
    }

    Ok(())
}
