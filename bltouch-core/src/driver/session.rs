//! Probe session configure

use bltouch_hal::{InputOverride, IrqEdge, LogSink, ProbeInput, ServoOutput};
use embedded_hal_async::delay::DelayNs;

use super::ProbeDriver;
use crate::error::ProbeError;

impl<S, P, D, L> ProbeDriver<'_, S, P, D, L>
where
    S: ServoOutput,
    P: ProbeInput,
    D: DelayNs,
    L: LogSink,
{
    /// Prepare the probe for a probing move, or put it away afterwards
    ///
    /// Clears the trigger latch, applies the polarity for the probing
    /// direction and arms (or disarms) the edge interrupt, then deploys
    /// when `probing` and stows otherwise.
    ///
    /// Polarity and arming are applied back to back before the first
    /// suspension point, so the edge watcher never sees one without the
    /// other.
    pub async fn configure(&mut self, is_probe_away: bool, probing: bool) -> Result<(), ProbeError> {
        self.latch.clear();
        self.inverted = self.config.invert_probe_pin ^ is_probe_away;
        self.is_probing = probing;

        self.probe.set_input_override(InputOverride::from_inverted(self.inverted));
        if probing {
            let edge = if self.inverted { IrqEdge::Falling } else { IrqEdge::Rising };
            self.probe.set_interrupt(edge, true);
        } else {
            self.probe.set_interrupt(IrqEdge::Both, false);
        }

        self.log(format_args!("Configure bltouch. probing: {}", probing as u8));

        #[cfg(feature = "defmt")]
        defmt::debug!("bltouch: configure inverted={} probing={}", self.inverted, probing);

        if probing {
            self.deploy().await
        } else {
            self.stow().await
        }
    }

    /// Apply the configured resting polarity with every edge disarmed
    ///
    /// Used before the first command so alarm readings see the same
    /// polarity a stowed session would.
    pub(super) fn apply_idle_polarity(&mut self) {
        self.latch.clear();
        self.inverted = self.config.invert_probe_pin;
        self.is_probing = false;
        self.probe.set_input_override(InputOverride::from_inverted(self.inverted));
        self.probe.set_interrupt(IrqEdge::Both, false);
    }
}

#[cfg(test)]
mod tests {
    use super::super::mock::*;
    use bltouch_hal::{InputOverride, IrqEdge};
    use crate::state::TriggerLatch;
    use embassy_futures::block_on;

    #[test]
    fn test_configure_probing_arms_rising_edge() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        let mut drv = rig.driver(&latch);

        assert_eq!(block_on(drv.configure(false, true)), Ok(()));
        let state = drv.state();
        drop(drv);

        assert!(state.is_probing);
        assert!(!state.inverted);
        assert_eq!(rig.probe.input_override, InputOverride::Normal);
        assert_eq!(rig.probe.irq, (IrqEdge::Rising, true));
        assert_eq!(rig.servo.probe_angles().as_slice(), &[10, 60]);
        assert!(rig.log.contains("Configure bltouch. probing: 1"));
    }

    #[test]
    fn test_configure_inverted_arms_falling_edge() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        rig.config.invert_probe_pin = true;
        let mut drv = rig.driver(&latch);

        block_on(drv.configure(false, true)).ok();
        drop(drv);

        assert_eq!(rig.probe.input_override, InputOverride::Inverted);
        assert_eq!(rig.probe.irq, (IrqEdge::Falling, true));
    }

    #[test]
    fn test_probe_away_xors_polarity() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        rig.config.invert_probe_pin = true;
        let mut drv = rig.driver(&latch);

        block_on(drv.configure(true, true)).ok();
        assert!(!drv.state().inverted);
        drop(drv);

        assert_eq!(rig.probe.input_override, InputOverride::Normal);
        assert_eq!(rig.probe.irq, (IrqEdge::Rising, true));
    }

    #[test]
    fn test_configure_idle_disarms_and_stows() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        let mut drv = rig.driver(&latch);

        block_on(drv.configure(false, true)).ok();
        assert_eq!(block_on(drv.configure(false, false)), Ok(()));
        assert!(!drv.state().is_probing);
        drop(drv);

        assert_eq!(rig.probe.irq, (IrqEdge::Both, false));
        assert_eq!(rig.servo.probe_angles().as_slice(), &[10, 60, 90]);
        assert!(rig.log.contains("Configure bltouch. probing: 0"));
    }

    #[test]
    fn test_configure_clears_latch() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        let mut drv = rig.driver(&latch);

        latch.set();
        assert!(drv.is_triggered());
        block_on(drv.configure(false, true)).ok();
        assert!(!drv.is_triggered());
    }

    #[test]
    fn test_configure_is_idempotent() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        let mut drv = rig.driver(&latch);

        block_on(drv.configure(true, true)).ok();
        let first_state = drv.state();
        let first_angle = drv.current_angle();
        drop(drv);
        let first_override = rig.probe.input_override;
        let first_irq = rig.probe.irq;
        let first_writes = rig.servo.writes.len();

        let mut drv = rig.driver(&latch);
        block_on(drv.configure(true, true)).ok();
        assert_eq!(drv.state(), first_state);
        assert_eq!(drv.current_angle(), first_angle);
        drop(drv);

        assert_eq!(rig.probe.input_override, first_override);
        assert_eq!(rig.probe.irq, first_irq);
        // Second run found the probe already deployed in software mode:
        // it rewrites DEPLOY then SW-MODE, and lands in the same place
        assert_eq!(rig.servo.angles[PROBE_CH as usize], Some(60.0));
        assert!(rig.servo.writes.len() >= first_writes);
    }

    #[test]
    fn test_configure_deploy_failure_is_returned() {
        let latch = TriggerLatch::new();
        let mut rig = Rig::new();
        rig.probe.idle = true;
        let mut drv = rig.driver(&latch);

        assert!(block_on(drv.configure(false, true)).is_err());
        drop(drv);

        // Arming happened regardless
        assert_eq!(rig.probe.irq, (IrqEdge::Rising, true));
    }
}
