//! Deploy/stow with alarm recovery
//!
//! A BLTouch that cannot move its pin (obstruction, pin stuck in a soft
//! surface) raises an alarm that looks like a trigger. Each action gets
//! exactly one recovery attempt. Failure is returned, never escalated.

use bltouch_hal::{LogSink, ProbeInput, ServoOutput};
use embedded_hal_async::delay::DelayNs;

use super::ProbeDriver;
use crate::command::{Command, OutputMode};
use crate::error::ProbeError;

impl<S, P, D, L> ProbeDriver<'_, S, P, D, L>
where
    S: ServoOutput,
    P: ProbeInput,
    D: DelayNs,
    L: LogSink,
{
    /// Clear an alarm
    ///
    /// The reading afterwards is not checked.
    pub async fn reset(&mut self) {
        self.issue(Command::Reset).await;
    }

    /// Stow the pin, resetting and retrying once on alarm
    ///
    /// On failure the probe is left at the stow angle.
    pub async fn stow(&mut self) -> Result<(), ProbeError> {
        self.log(format_args!("Stow requested"));
        let alarm = self.config.stow_alarm_level;

        if self.issue_for_alarm(Command::Stow, alarm).await {
            self.reset().await;
            if self.issue_for_alarm(Command::Stow, alarm).await {
                self.log(format_args!("Stow failed"));
                #[cfg(feature = "defmt")]
                defmt::warn!("bltouch: stow alarm persisted");
                return Err(ProbeError::AlarmPersisted(Command::Stow));
            }
        }
        Ok(())
    }

    /// Deploy the pin, running a full clear and retrying once on alarm
    ///
    /// On success the probe is switched to software mode last.
    pub async fn deploy(&mut self) -> Result<(), ProbeError> {
        self.log(format_args!("Deploy requested"));
        let alarm = self.config.deploy_alarm_level;

        if self.issue_for_alarm(Command::Deploy, alarm).await {
            self.clear().await;
            if self.issue_for_alarm(Command::Deploy, alarm).await {
                self.log(format_args!("Deploy failed"));
                #[cfg(feature = "defmt")]
                defmt::warn!("bltouch: deploy alarm persisted");
                return Err(ProbeError::AlarmPersisted(Command::Deploy));
            }
        }

        self.issue(Command::SwMode).await;
        Ok(())
    }

    /// Cycle the pin to shake off an alarm: reset, stow, deploy, stow
    ///
    /// Readings are ignored.
    pub async fn clear(&mut self) {
        for cmd in [Command::Reset, Command::Stow, Command::Deploy, Command::Stow] {
            self.issue(cmd).await;
        }
    }

    /// Bring the probe to a known state after power-up
    ///
    /// The persistent pin inversion is applied first.
    pub async fn init(&mut self) -> Result<(), ProbeError> {
        self.apply_idle_polarity();
        self.reset().await;
        self.stow().await
    }

    /// Run the probe's built-in self test
    ///
    /// The probe cycles its pin on its own. Stow afterwards to end it.
    pub async fn self_test(&mut self) -> bool {
        self.issue(Command::SelfTest).await
    }

    /// Switch the probe's output mode
    ///
    /// The pin is deployed while the mode is selected, optionally stored
    /// in the probe's EEPROM, then stowed.
    pub async fn set_output_mode(&mut self, mode: OutputMode, store: bool) -> Result<(), ProbeError> {
        self.issue(Command::Deploy).await;
        self.issue(mode.command()).await;
        if store {
            self.issue(Command::ModeStore).await;
        }
        self.stow().await
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::*;
    use crate::command::{Command, OutputMode};
    use crate::error::ProbeError;
    use crate::state::TriggerLatch;
    use bltouch_hal::{InputOverride, IrqEdge};
    use embassy_futures::block_on;

    const DEPLOY: u8 = 10;
    const SW_MODE: u8 = 60;
    const STOW: u8 = 90;
    const RESET: u8 = 160;

    #[test]
    fn test_stow_clean() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        let mut drv = rig.driver(&latch);

        assert_eq!(block_on(drv.stow()), Ok(()));
        drop(drv);

        assert_eq!(rig.servo.probe_angles().as_slice(), &[STOW]);
        assert!(rig.log.contains("Stow requested"));
    }

    #[test]
    fn test_stow_alarm_then_clear() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        rig.probe.script(&[true, false]);
        let mut drv = rig.driver(&latch);

        assert_eq!(block_on(drv.stow()), Ok(()));
        drop(drv);

        assert_eq!(rig.servo.probe_angles().as_slice(), &[STOW, RESET, STOW]);
        assert!(!rig.log.contains("Stow failed"));
    }

    #[test]
    fn test_stow_alarm_twice() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        // stow, reset, stow
        rig.probe.script(&[true, true, true]);
        let mut drv = rig.driver(&latch);

        assert_eq!(
            block_on(drv.stow()),
            Err(ProbeError::AlarmPersisted(Command::Stow))
        );
        assert_eq!(drv.current_angle(), Some(STOW as f32));
        drop(drv);

        assert_eq!(rig.servo.probe_angles().as_slice(), &[STOW, RESET, STOW]);
        assert!(rig.log.contains("Stow failed"));
    }

    #[test]
    fn test_deploy_clean() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        let mut drv = rig.driver(&latch);

        assert_eq!(block_on(drv.deploy()), Ok(()));
        drop(drv);

        assert_eq!(rig.servo.probe_angles().as_slice(), &[DEPLOY, SW_MODE]);
        assert!(rig.log.contains("Deploy requested"));
    }

    #[test]
    fn test_deploy_alarm_then_clear() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        // First deploy alarms, clear readings are ignored, retry is clean
        rig.probe.script(&[true, true, true, true, true, false]);
        let mut drv = rig.driver(&latch);

        assert_eq!(block_on(drv.deploy()), Ok(()));
        assert_eq!(drv.current_angle(), Some(SW_MODE as f32));
        drop(drv);

        assert_eq!(
            rig.servo.probe_angles().as_slice(),
            &[DEPLOY, RESET, STOW, DEPLOY, STOW, DEPLOY, SW_MODE]
        );
    }

    #[test]
    fn test_deploy_alarm_twice() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        rig.probe.idle = true;
        let mut drv = rig.driver(&latch);

        assert_eq!(
            block_on(drv.deploy()),
            Err(ProbeError::AlarmPersisted(Command::Deploy))
        );
        assert_eq!(drv.current_angle(), Some(DEPLOY as f32));
        drop(drv);

        // No software mode after a failed deploy
        assert!(!rig.servo.probe_angles().contains(&SW_MODE));
        assert!(rig.log.contains("Deploy failed"));
    }

    #[test]
    fn test_alarm_level_is_configurable() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        rig.config.stow_alarm_level = false;
        // A low reading now means alarm
        rig.probe.script(&[false, false, true]);
        let mut drv = rig.driver(&latch);

        assert_eq!(block_on(drv.stow()), Ok(()));
        drop(drv);

        assert_eq!(rig.servo.probe_angles().as_slice(), &[STOW, RESET, STOW]);
    }

    #[test]
    fn test_clear_sequence_ignores_alarms() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        rig.probe.idle = true;
        let mut drv = rig.driver(&latch);

        block_on(drv.clear());
        drop(drv);

        assert_eq!(rig.servo.probe_angles().as_slice(), &[RESET, STOW, DEPLOY, STOW]);
    }

    #[test]
    fn test_init_resets_then_stows() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        let mut drv = rig.driver(&latch);

        assert_eq!(block_on(drv.init()), Ok(()));
        drop(drv);

        assert_eq!(rig.servo.probe_angles().as_slice(), &[RESET, STOW]);
        assert_eq!(rig.delay.waits.as_slice(), &[500, 750]);
    }

    #[test]
    fn test_init_applies_persistent_inversion() {
        let latch = TriggerLatch::new();
        latch.set();
        let mut rig = Rig::new();
        rig.config.invert_probe_pin = true;
        rig.probe.irq = (IrqEdge::Rising, true);
        let mut drv = rig.driver(&latch);

        assert_eq!(block_on(drv.init()), Ok(()));
        assert!(drv.state().inverted);
        assert!(!drv.is_triggered());
        drop(drv);

        assert_eq!(rig.probe.input_override, InputOverride::Inverted);
        assert_eq!(rig.probe.irq, (IrqEdge::Both, false));
    }

    #[test]
    fn test_repeated_stow_is_deduplicated() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        let mut drv = rig.driver(&latch);

        block_on(drv.stow()).ok();
        block_on(drv.stow()).ok();
        drop(drv);

        assert_eq!(rig.servo.probe_angles().as_slice(), &[STOW]);
    }

    #[test]
    fn test_set_output_mode_and_store() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        let mut drv = rig.driver(&latch);

        assert_eq!(block_on(drv.set_output_mode(OutputMode::OpenDrain, true)), Ok(()));
        drop(drv);

        assert_eq!(rig.servo.probe_angles().as_slice(), &[DEPLOY, 150, 130, STOW]);
    }

    #[test]
    fn test_set_output_mode_without_store() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        let mut drv = rig.driver(&latch);

        assert_eq!(block_on(drv.set_output_mode(OutputMode::FiveVolt, false)), Ok(()));
        drop(drv);

        assert_eq!(rig.servo.probe_angles().as_slice(), &[DEPLOY, 140, STOW]);
    }

    #[test]
    fn test_self_test_issues_command() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        let mut drv = rig.driver(&latch);

        block_on(drv.self_test());
        drop(drv);

        assert_eq!(rig.servo.probe_angles().as_slice(), &[120]);
    }
}
