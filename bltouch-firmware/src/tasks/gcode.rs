//! G-code task
//!
//! Owns the probe plugin. Reads host lines, runs each through the plugin
//! and answers it with `ok` or `error:N`.

use defmt::*;
use embassy_rp::pwm::PwmOutput;
use embassy_rp::uart::BufferedUartRx;
use embassy_time::Delay;
use embedded_io_async::Read;

use bltouch_core::ProbeDriver;
use bltouch_drivers::{HousekeepingDelay, PortAllocator, ProbeHandle, PwmServo};
use bltouch_protocol::{BltouchPlugin, LineBuffer, LineEvent, MachineState, Status};

use crate::channels::{feed_watchdog, send_status, HostLog, HOST_TX, PROBE_LINE, TRIGGER};
use crate::config::FirmwareConfig;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

/// Toggles check mode
const CHECK_MODE_COMMAND: &str = "$C";

pub type FwServo = PwmServo<PwmOutput<'static>>;
type FwDelay = HousekeepingDelay<Delay, fn()>;
type FwPlugin = BltouchPlugin<'static, FwServo, ProbeHandle<'static>, FwDelay, HostLog>;

#[embassy_executor::task]
pub async fn gcode_task(
    mut rx: BufferedUartRx,
    servo: FwServo,
    mut ports: PortAllocator,
    config: FirmwareConfig,
) {
    info!("G-code task started");

    let delay: FwDelay = HousekeepingDelay::new(Delay, feed_watchdog as fn());
    let driver = ProbeDriver::new(
        servo,
        PROBE_LINE.handle(),
        delay,
        HostLog,
        config.servo_channel,
        config.bltouch,
        &TRIGGER,
    );
    let mut plugin: FwPlugin = BltouchPlugin::new(driver);

    if let Err(e) = plugin.init(&mut ports).await {
        warn!("BLTouch init: {}", e);
    }
    if config.apply_output_mode && plugin.has_actuator() {
        let mode = config.bltouch.output_mode;
        if let Err(e) = plugin.driver_mut().set_output_mode(mode, false).await {
            warn!("BLTouch output mode: {}", e);
        }
    }
    plugin.report_deferred();

    let mut state = MachineState::Idle;
    let mut lines = LineBuffer::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("UART read error: {:?}", e);
                lines.reset();
                continue;
            }
        };

        for &byte in &buf[..n] {
            let status = match lines.feed(byte) {
                None => continue,
                Some(LineEvent::Invalid) => Status::InvalidStatement,
                Some(LineEvent::Line(line)) if line.trim().eq_ignore_ascii_case(CHECK_MODE_COMMAND) => {
                    state = toggle_check_mode(state).await;
                    Status::Ok
                }
                Some(LineEvent::Line(line)) => {
                    debug!("RX: {}", line);
                    plugin.handle_line(state, line).await
                }
            };
            send_status(status).await;
        }
    }
}

async fn toggle_check_mode(state: MachineState) -> MachineState {
    let (next, msg) = match state {
        MachineState::CheckMode => (MachineState::Idle, "[MSG:Disabled]"),
        _ => (MachineState::CheckMode, "[MSG:Enabled]"),
    };
    let mut line = crate::channels::HostLine::new();
    let _ = line.push_str(msg);
    HOST_TX.send(line).await;
    next
}
