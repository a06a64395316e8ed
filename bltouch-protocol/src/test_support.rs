//! Test doubles for the plugin

use bltouch_core::{BltouchConfig, ProbeDriver, TriggerLatch};
use bltouch_hal::{
    InputOverride, IoPorts, IrqEdge, LogSink, PortDirection, PortKind, ProbeInput, ServoOutput,
};
use embedded_hal_async::delay::DelayNs;
use heapless::{Deque, String, Vec};

use crate::block::Block;
use crate::chain::{MachineState, McodeHandler, OptionReporter, ProbeHooks};
use crate::status::Status;

/// Channel the probe sits on in tests
pub const PROBE_CH: u8 = 0;

pub struct MockServo {
    pub count: u8,
    pub angles: [Option<f32>; 4],
    pub writes: Vec<(u8, f32), 32>,
}

impl MockServo {
    /// Angles written to the probe channel, in order
    pub fn probe_angles(&self) -> Vec<u8, 32> {
        self.writes
            .iter()
            .filter(|(ch, _)| *ch == PROBE_CH)
            .map(|(_, deg)| *deg as u8)
            .collect()
    }
}

impl ServoOutput for MockServo {
    fn channel_count(&self) -> u8 {
        self.count
    }

    fn set_angle(&mut self, channel: u8, degrees: f32) {
        if channel < self.count {
            self.angles[channel as usize] = Some(degrees);
            let _ = self.writes.push((channel, degrees));
        }
    }

    fn get_angle(&self, channel: u8) -> Option<f32> {
        self.angles.get(channel as usize).copied().flatten()
    }
}

pub struct MockProbe {
    pub readings: Deque<bool, 16>,
    pub idle: bool,
    pub input_override: InputOverride,
    pub irq: (IrqEdge, bool),
}

impl MockProbe {
    pub fn script(&mut self, readings: &[bool]) {
        for r in readings {
            let _ = self.readings.push_back(*r);
        }
    }
}

impl ProbeInput for MockProbe {
    fn is_active(&mut self) -> bool {
        self.readings.pop_front().unwrap_or(self.idle)
    }

    fn set_input_override(&mut self, mode: InputOverride) {
        self.input_override = mode;
    }

    fn set_interrupt(&mut self, edge: IrqEdge, enabled: bool) {
        self.irq = (edge, enabled);
    }
}

pub struct MockDelay {
    pub waits: Vec<u32, 32>,
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
    pub lines: Vec<String<64>, 32>,
}

impl MockLog {
    pub fn contains(&self, line: &str) -> bool {
        self.lines.iter().any(|l| l.as_str() == line)
    }

    /// Lines containing `needle` anywhere
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines.iter().filter(|l| l.contains(needle)).count()
    }
}

impl LogSink for MockLog {
    fn write_line(&mut self, line: &str) {
        let mut s = String::new();
        let _ = s.push_str(line);
        let _ = self.lines.push(s);
    }
}

/// Collaborators for one plugin under test
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
    /// Rig with `servos` servo channels
    pub fn new(servos: u8) -> Self {
        Self {
            servo: MockServo {
                count: servos,
                angles: [None; 4],
                writes: Vec::new(),
            },
            probe: MockProbe {
                readings: Deque::new(),
                idle: false,
                input_override: InputOverride::Normal,
                irq: (IrqEdge::None, false),
            },
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

/// Board with a number of free analog outputs and nothing else
pub struct Ports {
    outputs: u8,
    claimed: u8,
}

impl Ports {
    pub fn analog_outputs(outputs: u8) -> Self {
        Self { outputs, claimed: 0 }
    }
}

impl IoPorts for Ports {
    fn available(&self, kind: PortKind, direction: PortDirection) -> u8 {
        match (kind, direction) {
            (PortKind::Analog, PortDirection::Output) => self.outputs - self.claimed,
            _ => 0,
        }
    }

    fn claim(&mut self, kind: PortKind, direction: PortDirection, _description: &str) -> Option<u8> {
        if self.available(kind, direction) == 0 {
            return None;
        }
        self.claimed += 1;
        Some(self.outputs - self.claimed)
    }
}

/// Another plugin owning a single M-code and an options line
pub struct OtherPlugin {
    mcode: u16,
    pub executed: u8,
}

impl OtherPlugin {
    pub fn new(mcode: u16) -> Self {
        Self { mcode, executed: 0 }
    }
}

impl McodeHandler for OtherPlugin {
    fn check(&mut self, mcode: u16) -> bool {
        mcode == self.mcode
    }

    fn validate(&mut self, block: &Block) -> Status {
        if block.mcode == Some(self.mcode) {
            Status::Ok
        } else {
            Status::Unhandled
        }
    }

    fn execute(&mut self, _state: MachineState, block: &Block) -> bool {
        if block.mcode != Some(self.mcode) {
            return false;
        }
        self.executed += 1;
        true
    }
}

impl OptionReporter for OtherPlugin {
    fn report_options(&mut self, _newopt: bool, out: &mut dyn LogSink) {
        out.write_line("[PLUGIN:Other v1]");
    }
}

#[derive(Default)]
pub struct CountingHooks {
    pub starts: u8,
    pub completions: u8,
    pub deploys: u8,
    pub stows: u8,
    /// Answer `false` to probe start
    pub refuse_start: bool,
}

impl ProbeHooks for CountingHooks {
    fn on_probe_start(&mut self, _is_probe_away: bool) -> bool {
        self.starts += 1;
        !self.refuse_start
    }

    fn on_probe_completed(&mut self) {
        self.completions += 1;
    }

    fn on_probe_deploy(&mut self) {
        self.deploys += 1;
    }

    fn on_probe_stow(&mut self) {
        self.stows += 1;
    }
}
