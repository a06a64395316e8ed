//! BLTouch plugin
//!
//! Connects the probe driver to the host: probe session hooks, the
//! `M280`/`M401`/`M402` M-codes, the `$BLTOUCH` system command and the
//! options report. Each hook forwards to the handlers that were registered
//! before the plugin.
//!
//! | M-code | Words | Action |
//! |--------|-------|--------|
//! | M280 | `P<servo> S<deg>` | set a servo angle |
//! | M280 | `P<servo>` | report one servo position |
//! | M280 | none | report every servo position |
//! | M401 | none | deploy the probe |
//! | M402 | none | stow the probe |

use bltouch_core::{ProbeDriver, ProbeError};
use bltouch_hal::{IoPorts, LogSink, PortDirection, PortKind, ProbeInput, ServoOutput, MAX_ANGLE};
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;

use crate::block::Block;
use crate::chain::{Chain, ChainFull, MachineState, McodeHandler, OptionReporter, ProbeHooks};
use crate::status::Status;

/// Options report line
pub const PLUGIN_ID: &str = "[PLUGIN:BLTouch v0.01]";

/// System command answered by the plugin (`$BLTOUCH`)
pub const SYSTEM_COMMAND: &str = "BLTOUCH";

/// Set servo position / report it
pub const M_SERVO: u16 = 280;
/// Deploy probe
pub const M_DEPLOY: u16 = 401;
/// Stow probe
pub const M_STOW: u16 = 402;

/// Description given to claimed ports
pub const PORT_DESCRIPTION: &str = "Servo pin";

/// Maximum servo channels the plugin claims ports for
pub const MAX_SERVO_PORTS: usize = 4;

/// Probe plugin
pub struct BltouchPlugin<'a, S, P, D, L> {
    driver: ProbeDriver<'a, S, P, D, L>,
    /// Claimed port per servo channel
    ports: Vec<Option<u8>, MAX_SERVO_PORTS>,
    /// Probe channel has a claimed output
    actuator: bool,
    warning_pending: bool,
    mcodes: Chain<'a, dyn McodeHandler + 'a>,
    hooks: Chain<'a, dyn ProbeHooks + 'a>,
    reporters: Chain<'a, dyn OptionReporter + 'a>,
}

impl<'a, S, P, D, L> BltouchPlugin<'a, S, P, D, L>
where
    S: ServoOutput,
    P: ProbeInput,
    D: DelayNs,
    L: LogSink,
{
    /// Wrap a driver; call [`init`](Self::init) before use
    pub fn new(driver: ProbeDriver<'a, S, P, D, L>) -> Self {
        Self {
            driver,
            ports: Vec::new(),
            actuator: false,
            warning_pending: false,
            mcodes: Chain::new(),
            hooks: Chain::new(),
            reporters: Chain::new(),
        }
    }

    /// Register a previous M-code handler
    pub fn chain_mcodes(&mut self, handler: &'a mut dyn McodeHandler) -> Result<(), ChainFull> {
        self.mcodes.push(handler)
    }

    /// Register previous probe hooks
    pub fn chain_probe_hooks(&mut self, hooks: &'a mut dyn ProbeHooks) -> Result<(), ChainFull> {
        self.hooks.push(hooks)
    }

    /// Register a previous options reporter
    pub fn chain_reporter(&mut self, reporter: &'a mut dyn OptionReporter) -> Result<(), ChainFull> {
        self.reporters.push(reporter)
    }

    pub fn driver(&self) -> &ProbeDriver<'a, S, P, D, L> {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut ProbeDriver<'a, S, P, D, L> {
        &mut self.driver
    }

    /// Check whether the probe has a physical output
    pub fn has_actuator(&self) -> bool {
        self.actuator
    }

    /// Port claimed for a servo channel
    pub fn servo_port(&self, channel: u8) -> Option<u8> {
        self.ports.get(channel as usize).copied().flatten()
    }

    /// Claim output ports and bring the probe to a known state
    ///
    /// Ports are claimed for every servo channel, highest channel first.
    /// Without a port for the probe channel the plugin stays inert and a
    /// warning is queued for [`report_deferred`](Self::report_deferred).
    pub async fn init<IO: IoPorts + ?Sized>(&mut self, io: &mut IO) -> Result<(), ProbeError> {
        let count = (self.driver.servo().channel_count() as usize).min(MAX_SERVO_PORTS);
        self.ports.clear();
        for _ in 0..count {
            let _ = self.ports.push(None);
        }
        for channel in (0..count).rev() {
            self.ports[channel] = io.claim(PortKind::Analog, PortDirection::Output, PORT_DESCRIPTION);
        }

        self.actuator = self.servo_port(self.driver.channel()).is_some();
        if !self.actuator {
            self.warning_pending = true;
            #[cfg(feature = "defmt")]
            defmt::warn!("bltouch: no servo output available");
            return Ok(());
        }

        self.driver.init().await
    }

    /// Emit warnings queued during init, once
    pub fn report_deferred(&mut self) {
        if core::mem::take(&mut self.warning_pending) {
            self.driver
                .log_mut()
                .write_line("warning: BLTouch has no servo output, probe disabled");
        }
    }

    /// Session configure hook
    pub async fn probe_configure(&mut self, is_probe_away: bool, probing: bool) -> Result<(), ProbeError> {
        if !self.actuator {
            return Ok(());
        }
        self.driver.configure(is_probe_away, probing).await
    }

    /// Trigger query hook
    pub fn is_triggered(&self) -> bool {
        self.driver.is_triggered()
    }

    /// Deploy the probe, then the chained deploy hooks
    pub async fn deploy(&mut self) -> Result<(), ProbeError> {
        let result = if self.actuator {
            self.driver.deploy().await
        } else {
            Ok(())
        };
        self.hooks.on_probe_deploy();
        result
    }

    /// Stow the probe, then the chained stow hooks
    pub async fn stow(&mut self) -> Result<(), ProbeError> {
        let result = if self.actuator {
            self.driver.stow().await
        } else {
            Ok(())
        };
        self.hooks.on_probe_stow();
        result
    }

    /// Probing is about to start
    ///
    /// Configures and deploys first, then always runs the chained hooks.
    /// `false` aborts the probing move; the probe is disarmed and stowed
    /// again before returning, since no completion will follow.
    pub async fn on_probe_start(&mut self, is_probe_away: bool) -> bool {
        let deployed = self.probe_configure(is_probe_away, true).await.is_ok();
        let chained = self.hooks.on_probe_start(is_probe_away);
        if deployed && chained {
            return true;
        }
        let _ = self.probe_configure(false, false).await;
        false
    }

    /// Probing finished: chained hooks first, then disarm and stow
    ///
    /// A stow failure is already logged by the driver and not reported
    /// further.
    pub async fn on_probe_completed(&mut self) {
        self.hooks.on_probe_completed();
        let _ = self.probe_configure(false, false).await;
    }

    /// Options report: previous reporters, then the plugin line
    pub fn report_options(&mut self, newopt: bool) {
        let out = self.driver.log_mut();
        self.reporters.report_options(newopt, out);
        if !newopt {
            out.write_line(PLUGIN_ID);
        }
    }

    /// `$` system command
    ///
    /// `$BLTOUCH` is accepted and does nothing.
    pub fn system_command(&mut self, command: &str) -> Status {
        if command.trim().eq_ignore_ascii_case(SYSTEM_COMMAND) {
            Status::Ok
        } else {
            Status::Unhandled
        }
    }

    /// Check whether an M-code is handled here or further down the chain
    pub fn check(&mut self, mcode: u16) -> bool {
        matches!(mcode, M_SERVO | M_DEPLOY | M_STOW) || self.mcodes.check(mcode)
    }

    /// Validate a block; nothing is changed
    pub fn validate(&mut self, block: &Block) -> Status {
        match block.mcode {
            Some(M_SERVO) => self.validate_servo(block),
            Some(M_DEPLOY) | Some(M_STOW) => {
                if block.unused_words(&[]).is_empty() {
                    Status::Ok
                } else {
                    Status::GcodeUnusedWords
                }
            }
            _ => self.mcodes.validate(block),
        }
    }

    fn validate_servo(&self, block: &Block) -> Status {
        if let Some(p) = block.p {
            if p.is_nan() {
                return Status::BadNumberFormat;
            }
            if p < 0.0 {
                return Status::NegativeValue;
            }
            let index = p as u8;
            if index as f32 != p || !self.driver.servo().has_channel(index) {
                return Status::GcodeValueOutOfRange;
            }
        }
        if let Some(s) = block.s {
            if s.is_nan() {
                return Status::BadNumberFormat;
            }
            if s < 0.0 {
                return Status::NegativeValue;
            }
            if s > MAX_ANGLE {
                return Status::GcodeValueOutOfRange;
            }
        }
        if !block.unused_words(&['P', 'S']).is_empty() {
            return Status::GcodeUnusedWords;
        }
        Status::Ok
    }

    /// Execute a validated block
    ///
    /// Returns `false` if neither the plugin nor the chain took it. Our own
    /// M-codes do nothing in check mode.
    pub async fn execute(&mut self, state: MachineState, block: &Block) -> bool {
        let mcode = match block.mcode {
            Some(code @ (M_SERVO | M_DEPLOY | M_STOW)) => code,
            _ => return self.mcodes.execute(state, block),
        };
        if state == MachineState::CheckMode {
            return true;
        }

        match mcode {
            M_SERVO => self.execute_servo(block),
            M_DEPLOY => {
                let _ = self.deploy().await;
            }
            _ => {
                let _ = self.stow().await;
            }
        }
        true
    }

    fn execute_servo(&mut self, block: &Block) {
        let channel = block.p.map(|p| p as u8);
        match (channel, block.s) {
            (channel, Some(degrees)) => {
                self.driver.log_mut().write_line("Setting servo position");
                self.driver
                    .servo_mut()
                    .set_angle(channel.unwrap_or(0), degrees);
            }
            (Some(channel), None) => self.report_position(channel),
            (None, None) => {
                for channel in 0..self.driver.servo().channel_count() {
                    self.report_position(channel);
                }
            }
        }
    }

    fn report_position(&mut self, channel: u8) {
        let degrees = self
            .driver
            .servo()
            .get_angle(channel)
            .map(|a| (a + 0.5) as u16)
            .unwrap_or(0);
        bltouch_core::diag::emit(
            self.driver.log_mut(),
            format_args!("[Servo position :{}:{:x}]", degrees, degrees),
        );
    }
}
