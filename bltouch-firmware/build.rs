//! Build script for bltouch-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates bltouch.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Servo channels wired on the board
const SERVO_CHANNELS: i64 = 2;

/// Longest settle delay accepted by the driver (ms)
const MAX_SETTLE_DELAY_MS: i64 = 10_000;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate bltouch.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=bltouch.toml");

    let config_path = Path::new("bltouch.toml");
    if !config_path.exists() {
        fail(
            "bltouch.toml not found",
            &["Create one in the bltouch-firmware directory".to_string()],
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read bltouch.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let lines: Vec<String> = e.to_string().lines().map(str::to_string).collect();
            fail("Invalid TOML syntax in bltouch.toml", &lines);
        }
    };

    let mut errors = Vec::new();
    validate_servo(&config, &mut errors);
    validate_bltouch(&config, &mut errors);
    validate_host(&config, &mut errors);
    if !errors.is_empty() {
        fail("Invalid configuration in bltouch.toml", &errors);
    }

    println!("cargo:warning=bltouch.toml validated successfully");
}

/// Abort the build with a boxed error list
fn fail(title: &str, errors: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| {
                let e = if e.len() > 60 { format!("{}...", &e[..57]) } else { e.clone() };
                format!("║  • {:<62} ║", e)
            })
            .collect::<Vec<_>>()
            .join("\n")
    );
}

fn integer(table: &toml::Table, section: &str, key: &str, errors: &mut Vec<String>) -> Option<i64> {
    match table.get(key) {
        None => None,
        Some(toml::Value::Integer(v)) => Some(*v),
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            None
        }
    }
}

fn check_bool(table: &toml::Table, section: &str, key: &str, errors: &mut Vec<String>) {
    if let Some(v) = table.get(key) {
        if !v.is_bool() {
            errors.push(format!("[{}] {} must be true or false", section, key));
        }
    }
}

fn section<'a>(config: &'a toml::Value, name: &str, errors: &mut Vec<String>) -> Option<&'a toml::Table> {
    match config.get(name) {
        None => None,
        Some(toml::Value::Table(t)) => Some(t),
        Some(_) => {
            errors.push(format!("[{}] must be a table", name));
            None
        }
    }
}

/// Validate the [servo] section
fn validate_servo(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(servo) = section(config, "servo", errors) else {
        return;
    };

    let freq = integer(servo, "servo", "pwm_freq_hz", errors).unwrap_or(50);
    let min = integer(servo, "servo", "min_pulse_us", errors).unwrap_or(544);
    let max = integer(servo, "servo", "max_pulse_us", errors).unwrap_or(2400);

    if !(1..=400).contains(&freq) {
        errors.push("[servo] pwm_freq_hz must be 1-400".to_string());
        return;
    }
    if min <= 0 || min >= max {
        errors.push("[servo] min_pulse_us must be positive and below max_pulse_us".to_string());
    }
    if max > 1_000_000 / freq {
        errors.push("[servo] max_pulse_us does not fit the PWM period".to_string());
    }
}

/// Validate the [bltouch] section
fn validate_bltouch(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(bltouch) = section(config, "bltouch", errors) else {
        errors.push("Missing [bltouch] section".to_string());
        return;
    };

    match bltouch.get("probe_pin") {
        Some(toml::Value::String(pin)) => {
            let name = pin.trim_start_matches(['!', '^']);
            let valid = name
                .strip_prefix("gpio")
                .and_then(|n| n.parse::<u8>().ok())
                .is_some_and(|n| n < 30);
            if !valid {
                errors.push(format!("[bltouch] probe_pin '{}' is not a gpio pin", pin));
            }
        }
        Some(_) => errors.push("[bltouch] probe_pin must be a string".to_string()),
        None => errors.push("[bltouch] missing 'probe_pin'".to_string()),
    }

    if let Some(channel) = integer(bltouch, "bltouch", "servo_channel", errors) {
        if !(0..SERVO_CHANNELS).contains(&channel) {
            errors.push(format!("[bltouch] servo_channel must be 0-{}", SERVO_CHANNELS - 1));
        }
    }

    for key in ["command_delay_ms", "sw_mode_delay_ms"] {
        if let Some(ms) = integer(bltouch, "bltouch", key, errors) {
            if !(1..=MAX_SETTLE_DELAY_MS).contains(&ms) {
                errors.push(format!("[bltouch] {} must be 1-{}", key, MAX_SETTLE_DELAY_MS));
            }
        }
    }

    for key in ["deploy_alarm_level", "stow_alarm_level", "apply_output_mode"] {
        check_bool(bltouch, "bltouch", key, errors);
    }

    if let Some(mode) = bltouch.get("output_mode") {
        if !matches!(mode.as_str(), Some("5v") | Some("od")) {
            errors.push("[bltouch] output_mode must be '5v' or 'od'".to_string());
        }
    }
}

/// Validate the [host] section
fn validate_host(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(host) = section(config, "host", errors) else {
        return;
    };
    if let Some(baud) = integer(host, "host", "baud_rate", errors) {
        if !(1200..=1_000_000).contains(&baud) {
            errors.push("[host] baud_rate must be 1200-1000000".to_string());
        }
    }
}
