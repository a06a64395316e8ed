//! BLTouch probe driver
//!
//! One [`ProbeDriver`] owns the collaborators for one probe: the servo
//! output carrying the command angle, the probe input line, a delay that
//! keeps host housekeeping running, and the diagnostic sink.
//!
//! The driver is layered:
//!
//! - command layer ([`ProbeDriver::issue`]): angle write + settle delay +
//!   trigger sample, with deduplication of repeated angles
//! - recovery ([`ProbeDriver::stow`], [`ProbeDriver::deploy`], ...): one
//!   bounded retry per action
//! - session ([`ProbeDriver::configure`]): polarity, interrupt arming and
//!   the matching deploy/stow
//!
//! Every async method takes `&mut self`, so a second probe command cannot
//! start while one is waiting out its settle delay.

mod recovery;
mod session;

#[cfg(test)]
pub(crate) mod mock;

use bltouch_hal::{LogSink, ProbeInput, ServoOutput};
use embedded_hal_async::delay::DelayNs;

use crate::command::Command;
use crate::config::BltouchConfig;
use crate::diag;
use crate::state::{ProbeState, TriggerLatch};

/// Driver for a servo-commanded BLTouch probe
pub struct ProbeDriver<'a, S, P, D, L> {
    servo: S,
    probe: P,
    delay: D,
    log: L,
    /// Servo channel the probe signal wire is on
    channel: u8,
    config: BltouchConfig,
    latch: &'a TriggerLatch,
    inverted: bool,
    is_probing: bool,
}

impl<'a, S, P, D, L> ProbeDriver<'a, S, P, D, L>
where
    S: ServoOutput,
    P: ProbeInput,
    D: DelayNs,
    L: LogSink,
{
    /// Create a driver for the probe on `channel`
    ///
    /// Nothing is written to the hardware until the first command.
    pub fn new(
        servo: S,
        probe: P,
        delay: D,
        log: L,
        channel: u8,
        config: BltouchConfig,
        latch: &'a TriggerLatch,
    ) -> Self {
        Self {
            servo,
            probe,
            delay,
            log,
            channel,
            config,
            latch,
            inverted: false,
            is_probing: false,
        }
    }

    /// Servo channel the probe is on
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Active configuration
    pub fn config(&self) -> &BltouchConfig {
        &self.config
    }

    /// Servo output (all channels)
    pub fn servo(&self) -> &S {
        &self.servo
    }

    /// Mutable servo output
    ///
    /// Writes to the probe channel are seen by deduplication because the
    /// current angle is read back from the servo output.
    pub fn servo_mut(&mut self) -> &mut S {
        &mut self.servo
    }

    /// Diagnostic sink
    pub fn log_mut(&mut self) -> &mut L {
        &mut self.log
    }

    /// Last angle written to the probe channel
    ///
    /// `None` until the first command.
    pub fn current_angle(&self) -> Option<f32> {
        self.servo.get_angle(self.channel)
    }

    /// Check whether the edge watcher latched a trigger
    ///
    /// Non-blocking. Does not touch the servo or the session state.
    pub fn is_triggered(&self) -> bool {
        self.latch.is_set()
    }

    /// Snapshot of the session state
    pub fn state(&self) -> ProbeState {
        ProbeState {
            triggered: self.latch.is_set(),
            inverted: self.inverted,
            is_probing: self.is_probing,
        }
    }

    /// Minimum settle delay for a command before the configured floor
    fn min_delay_ms(&self, cmd: Command) -> u32 {
        match cmd {
            Command::SwMode => self.config.sw_mode_delay_ms,
            _ => cmd.min_delay_ms(),
        }
    }

    /// Settle delay actually applied after writing `cmd`
    pub fn effective_delay_ms(&self, cmd: Command, requested_ms: u32) -> u32 {
        requested_ms
            .max(self.min_delay_ms(cmd))
            .max(self.config.command_delay_ms)
    }

    /// Issue a command with its default settle delay
    ///
    /// Returns the live trigger reading after the delay.
    pub async fn issue(&mut self, cmd: Command) -> bool {
        self.issue_with_delay(cmd, 0).await
    }

    /// Issue a command, waiting at least `requested_ms` to settle
    ///
    /// If the probe channel already holds the command's angle nothing is
    /// written and no delay is taken; the trigger is still sampled.
    pub async fn issue_with_delay(&mut self, cmd: Command, requested_ms: u32) -> bool {
        let angle = cmd.angle();
        self.log(format_args!("Command bltouch: {}", angle));

        if self.current_angle() != Some(angle as f32) {
            let settle_ms = self.effective_delay_ms(cmd, requested_ms);
            self.servo.set_angle(self.channel, angle as f32);

            #[cfg(feature = "defmt")]
            defmt::debug!("bltouch: {} ({} deg), settle {} ms", cmd, angle, settle_ms);

            self.delay.delay_ms(settle_ms).await;
        }

        self.probe.is_active()
    }

    /// Issue a command and report whether the reading means "alarm"
    async fn issue_for_alarm(&mut self, cmd: Command, alarm_level: bool) -> bool {
        self.issue(cmd).await == alarm_level
    }

    fn log(&mut self, args: core::fmt::Arguments<'_>) {
        diag::emit(&mut self.log, args);
    }
}
