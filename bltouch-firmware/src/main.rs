//! BLTouch probe firmware
//!
//! Firmware binary for RP2040-based boards. Drives a BLTouch on one of two
//! servo headers and takes M280/M401/M402 from a host over UART0.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart, Config as UartConfig};
use embassy_rp::watchdog::Watchdog;
use embassy_time::{Duration, Ticker};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use bltouch_core::ServoConfig;
use bltouch_drivers::{PortAllocator, PwmServo};
use bltouch_hal::{PortDirection, PortKind};

use crate::channels::{feed_watchdog, WATCHDOG};
use crate::config::{parse_config, FirmwareConfig};
use crate::tasks::gcode::FwServo;

mod channels;
mod config;
mod tasks;

/// Embedded configuration (compiled into firmware)
/// Edit bltouch.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../bltouch.toml");

/// GPIOs on the servo headers, in servo channel order (PWM slice 6 A/B)
const SERVO_GPIOS: [u8; 2] = [28, 29];

/// GPIO on the probe signal header
const PROBE_GPIO: u8 = 22;

/// PWM clock divider; 125 MHz / 64 gives 50 Hz at top = 39061
const PWM_DIVIDER: u8 = 64;

const WATCHDOG_TIMEOUT_MS: u64 = 2_000;
const WATCHDOG_FEED_MS: u64 = 500;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("BLTouch firmware starting...");

    let p = embassy_rp::init(Default::default());
    let config = load_config();

    // Host UART
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.baud_rate;
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = BufferedUart::new(p.UART0, p.PIN_0, p.PIN_1, Irqs, tx_buf, rx_buf, uart_config);
    let (tx, rx) = uart.split();
    info!("UART0 initialized at {} baud", config.baud_rate);

    // Probe input
    if config.probe_pin.pin != PROBE_GPIO {
        warn!(
            "probe_pin gpio{} ignored, the probe header is gpio{}",
            config.probe_pin.pin, PROBE_GPIO
        );
    }
    let pull = if config.probe_pin.pull_up { Pull::Up } else { Pull::None };
    let probe_pin = Input::new(p.PIN_22, pull);

    // Servo PWM
    let mut pwm_config = PwmConfig::default();
    pwm_config.divider = PWM_DIVIDER.into();
    pwm_config.top = pwm_top(config.servo.pwm_freq_hz);
    let pwm = Pwm::new_output_ab(p.PWM_SLICE6, p.PIN_28, p.PIN_29, pwm_config);
    let servo = build_servo(pwm, config.servo);
    info!("PWM initialized, top={}", pwm_top(config.servo.pwm_freq_hz));

    // Ports the plugin may claim
    let mut ports = PortAllocator::new();
    for gpio in SERVO_GPIOS {
        if let Err(e) = ports.add_port(gpio, PortKind::Analog, PortDirection::Output) {
            warn!("servo port gpio{}: {}", gpio, e);
        }
    }

    let mut watchdog = Watchdog::new(p.WATCHDOG);
    watchdog.start(Duration::from_millis(WATCHDOG_TIMEOUT_MS));
    WATCHDOG.lock(|w| *w.borrow_mut() = Some(watchdog));

    spawner.spawn(tasks::probe_watch_task(probe_pin).unwrap());
    spawner.spawn(tasks::host_tx_task(tx).unwrap());
    spawner.spawn(tasks::gcode_task(rx, servo, ports, config).unwrap());

    info!("All tasks spawned, firmware running");

    let mut ticker = Ticker::every(Duration::from_millis(WATCHDOG_FEED_MS));
    loop {
        ticker.next().await;
        feed_watchdog();
    }
}

/// Parse the embedded configuration, falling back to defaults
fn load_config() -> FirmwareConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            // build.rs validates the file, so this only happens on a
            // value the firmware parser rejects
            error!("Failed to parse embedded config: {}", e);
            FirmwareConfig::default()
        }
    }
}

/// PWM counter top for a servo frequency at [`PWM_DIVIDER`]
fn pwm_top(freq_hz: u16) -> u16 {
    let ticks = embassy_rp::clocks::clk_sys_freq() / PWM_DIVIDER as u32 / freq_hz.max(1) as u32;
    ticks.saturating_sub(1).min(u16::MAX as u32) as u16
}

/// Servo driver over both outputs of the PWM slice
fn build_servo(pwm: Pwm<'static>, config: ServoConfig) -> FwServo {
    let mut servo = match PwmServo::new(config) {
        Ok(servo) => servo,
        Err(e) => {
            error!("servo config: {}", e);
            unwrap!(PwmServo::new(ServoConfig::default()))
        }
    };

    let (a, b) = pwm.split();
    for output in [a, b].into_iter().flatten() {
        if let Err(e) = servo.add_channel(output) {
            warn!("servo channel: {}", e);
        }
    }
    servo
}
