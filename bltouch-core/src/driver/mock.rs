//! Test doubles for the probe driver

use bltouch_hal::{InputOverride, IrqEdge, LogSink, ProbeInput, ServoOutput};
use embedded_hal_async::delay::DelayNs;
use heapless::{Deque, String, Vec};

use super::ProbeDriver;
use crate::config::BltouchConfig;
use crate::state::TriggerLatch;

/// Channel the probe sits on in tests
pub const PROBE_CH: u8 = 1;

pub struct MockServo {
    pub angles: [Option<f32>; 4],
    pub writes: Vec<(u8, f32), 64>,
}

impl MockServo {
    pub fn new() -> Self {
        Self {
            angles: [None; 4],
            writes: Vec::new(),
        }
    }

    /// Angles written to the probe channel, in order
    pub fn probe_angles(&self) -> Vec<u8, 64> {
        self.writes
            .iter()
            .filter(|(ch, _)| *ch == PROBE_CH)
            .map(|(_, deg)| *deg as u8)
            .collect()
    }
}

impl ServoOutput for MockServo {
    fn channel_count(&self) -> u8 {
        self.angles.len() as u8
    }

    fn set_angle(&mut self, channel: u8, degrees: f32) {
        if let Some(slot) = self.angles.get_mut(channel as usize) {
            *slot = Some(degrees);
            let _ = self.writes.push((channel, degrees));
        }
    }

    fn get_angle(&self, channel: u8) -> Option<f32> {
        self.angles.get(channel as usize).copied().flatten()
    }
}

/// Probe line that replays scripted readings
///
/// Once the script runs out every reading is `idle`.
pub struct MockProbe {
    pub readings: Deque<bool, 32>,
    pub idle: bool,
    pub samples: usize,
    pub input_override: InputOverride,
    pub irq: (IrqEdge, bool),
    pub irq_calls: usize,
}

impl MockProbe {
    pub fn new() -> Self {
        Self {
            readings: Deque::new(),
            idle: false,
            samples: 0,
            input_override: InputOverride::Normal,
            irq: (IrqEdge::None, false),
            irq_calls: 0,
        }
    }

    pub fn script(&mut self, readings: &[bool]) {
        for r in readings {
            let _ = self.readings.push_back(*r);
        }
    }
}

impl ProbeInput for MockProbe {
    fn is_active(&mut self) -> bool {
        self.samples += 1;
        self.readings.pop_front().unwrap_or(self.idle)
    }

    fn set_input_override(&mut self, mode: InputOverride) {
        self.input_override = mode;
    }

    fn set_interrupt(&mut self, edge: IrqEdge, enabled: bool) {
        self.irq = (edge, enabled);
        self.irq_calls += 1;
    }
}

/// Delay that returns immediately and records what was asked for
pub struct MockDelay {
    pub waits: Vec<u32, 64>,
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        let _ = self.waits.push(ns / 1_000_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        let _ = self.waits.push(ms);
    }
}

pub struct MockLog {
    pub lines: Vec<String<64>, 64>,
}

impl MockLog {
    pub fn contains(&self, line: &str) -> bool {
        self.lines.iter().any(|l| l.as_str() == line)
    }
}

impl LogSink for MockLog {
    fn write_line(&mut self, line: &str) {
        let mut s = String::new();
        let _ = s.push_str(line);
        let _ = self.lines.push(s);
    }
}

/// Collaborators for one driver under test
pub struct Rig {
    pub servo: MockServo,
    pub probe: MockProbe,
    pub delay: MockDelay,
    pub log: MockLog,
    pub config: BltouchConfig,
}

pub type TestDriver<'r> =
    ProbeDriver<'r, &'r mut MockServo, &'r mut MockProbe, &'r mut MockDelay, &'r mut MockLog>;

impl Rig {
    pub fn new() -> Self {
        Self {
            servo: MockServo::new(),
            probe: MockProbe::new(),
            delay: MockDelay { waits: Vec::new() },
            log: MockLog { lines: Vec::new() },
            config: BltouchConfig::default(),
        }
    }

    pub fn driver<'r>(&'r mut self, latch: &'r TriggerLatch) -> TestDriver<'r> {
        ProbeDriver::new(
            &mut self.servo,
            &mut self.probe,
            &mut self.delay,
            &mut self.log,
            PROBE_CH,
            self.config,
            latch,
        )
    }
}
