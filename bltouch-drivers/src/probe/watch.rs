//! Edge watcher
//!
//! Body of the task that owns the probe pin. It waits for the opposite of
//! the current level, so every transition is seen in order even if the
//! pin has already moved back by the time the task runs.

use core::convert::Infallible;

use bltouch_core::state::TriggerLatch;
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;

use super::ProbeLine;

/// Mirror the pin into `line` and latch armed edges
///
/// Runs until the pin reports an error.
pub async fn watch_edges<I>(pin: &mut I, line: &ProbeLine, latch: &TriggerLatch) -> Result<Infallible, I::Error>
where
    I: InputPin + Wait,
{
    let mut high = pin.is_high()?;
    line.seed_level(high);

    loop {
        if high {
            pin.wait_for_low().await?;
        } else {
            pin.wait_for_high().await?;
        }
        high = !high;

        let fired = line.update_level(high, latch);
        #[cfg(feature = "defmt")]
        if fired {
            defmt::debug!("probe: triggered");
        }
        let _ = fired;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bltouch_hal::{IrqEdge, ProbeInput};
    use embassy_futures::block_on;
    use embedded_hal::digital::{ErrorKind, ErrorType};
    use heapless::Deque;

    #[derive(Debug, PartialEq)]
    struct EndOfScript;

    impl embedded_hal::digital::Error for EndOfScript {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    /// Pin that walks through a list of levels, one per wait
    struct ScriptedPin {
        level: bool,
        next: Deque<bool, 16>,
    }

    impl ScriptedPin {
        fn new(start: bool, levels: &[bool]) -> Self {
            let mut next = Deque::new();
            for l in levels {
                let _ = next.push_back(*l);
            }
            Self { level: start, next }
        }

        fn wait_for(&mut self, target: bool) -> Result<(), EndOfScript> {
            while self.level != target {
                self.level = self.next.pop_front().ok_or(EndOfScript)?;
            }
            Ok(())
        }
    }

    impl ErrorType for ScriptedPin {
        type Error = EndOfScript;
    }

    impl InputPin for ScriptedPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.level)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.level)
        }
    }

    impl Wait for ScriptedPin {
        async fn wait_for_high(&mut self) -> Result<(), Self::Error> {
            self.wait_for(true)
        }

        async fn wait_for_low(&mut self) -> Result<(), Self::Error> {
            self.wait_for(false)
        }

        async fn wait_for_rising_edge(&mut self) -> Result<(), Self::Error> {
            self.wait_for(false)?;
            self.wait_for(true)
        }

        async fn wait_for_falling_edge(&mut self) -> Result<(), Self::Error> {
            self.wait_for(true)?;
            self.wait_for(false)
        }

        async fn wait_for_any_edge(&mut self) -> Result<(), Self::Error> {
            let target = !self.level;
            self.wait_for(target)
        }
    }

    #[test]
    fn test_rising_edge_latches() {
        let line = ProbeLine::new();
        let latch = TriggerLatch::new();
        line.handle().set_interrupt(IrqEdge::Rising, true);
        let mut pin = ScriptedPin::new(false, &[true, false]);

        let result = block_on(watch_edges(&mut pin, &line, &latch));

        assert_eq!(result.err(), Some(EndOfScript));
        assert!(latch.is_set());
        assert!(!line.level());
    }

    #[test]
    fn test_inverted_probe_latches_on_fall() {
        let line = ProbeLine::new();
        let latch = TriggerLatch::new();
        line.handle().set_interrupt(IrqEdge::Falling, true);
        let mut pin = ScriptedPin::new(true, &[false]);

        let _ = block_on(watch_edges(&mut pin, &line, &latch));

        assert!(latch.is_set());
    }

    #[test]
    fn test_starting_level_is_not_an_edge() {
        let line = ProbeLine::new();
        let latch = TriggerLatch::new();
        line.handle().set_interrupt(IrqEdge::Both, true);
        let mut pin = ScriptedPin::new(true, &[]);

        let _ = block_on(watch_edges(&mut pin, &line, &latch));

        assert!(!latch.is_set());
        assert!(line.level());
    }

    #[test]
    fn test_disarmed_edges_only_mirror() {
        let line = ProbeLine::new();
        let latch = TriggerLatch::new();
        let mut pin = ScriptedPin::new(false, &[true, false, true]);

        let _ = block_on(watch_edges(&mut pin, &line, &latch));

        assert!(!latch.is_set());
        assert!(line.level());
    }
}
