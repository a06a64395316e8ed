//! PWM hobby servo driver
//!
//! A hobby servo reads its target angle from the pulse width of a 50 Hz
//! signal: 544 µs at 0° up to 2400 µs at 180° by default. This driver
//! owns one PWM channel per servo and converts angles to duty cycles for
//! whatever resolution the PWM slice was configured with.
//!
//! ```ignore
//! let mut servos = PwmServo::new(ServoConfig::default())?;
//! let probe_ch = servos.add_channel(pwm_a)?;
//! servos.set_angle(probe_ch, 90.0);
//! ```

use bltouch_core::config::ServoConfig;
use bltouch_core::error::ConfigError;
use bltouch_hal::ServoOutput;
use embedded_hal::pwm::SetDutyCycle;
use heapless::Vec;

/// Maximum number of servo channels per driver
pub const MAX_SERVOS: usize = 4;

/// Servo driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServoError {
    /// Servo configuration rejected
    Config(ConfigError),
    /// No room for another channel
    TooManyChannels,
}

impl From<ConfigError> for ServoError {
    fn from(e: ConfigError) -> Self {
        ServoError::Config(e)
    }
}

impl core::fmt::Display for ServoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ServoError::Config(e) => write!(f, "servo config: {}", e),
            ServoError::TooManyChannels => f.write_str("too many servo channels"),
        }
    }
}

struct Channel<C> {
    pwm: C,
    /// Last angle successfully written
    angle: Option<f32>,
}

/// Multi-channel servo output over PWM
pub struct PwmServo<C> {
    config: ServoConfig,
    channels: Vec<Channel<C>, MAX_SERVOS>,
}

impl<C: SetDutyCycle> PwmServo<C> {
    /// Create a driver with no channels
    pub fn new(config: ServoConfig) -> Result<Self, ServoError> {
        config.validate()?;
        Ok(Self {
            config,
            channels: Vec::new(),
        })
    }

    /// Add a PWM channel, returning its servo index
    ///
    /// The output stays off until the first angle is written.
    pub fn add_channel(&mut self, mut pwm: C) -> Result<u8, ServoError> {
        let index = self.channels.len() as u8;
        // Ignore a failing switch-off; the first angle write reports it
        let _ = pwm.set_duty_cycle_fully_off();
        self.channels
            .push(Channel { pwm, angle: None })
            .map_err(|_| ServoError::TooManyChannels)?;
        Ok(index)
    }

    /// Servo configuration
    pub fn config(&self) -> &ServoConfig {
        &self.config
    }

    /// Duty cycle for an angle at a given PWM resolution
    pub fn duty_for(&self, max_duty: u16, degrees: f32) -> u16 {
        let period = self.config.period_us() as f32;
        if period <= 0.0 {
            return 0;
        }
        let duty = self.config.pulse_us(degrees) * max_duty as f32 / period;
        (duty + 0.5) as u16
    }

    /// Stop driving a channel
    ///
    /// The servo goes limp and the channel reads back as never written.
    pub fn release(&mut self, channel: u8) {
        if let Some(ch) = self.channels.get_mut(channel as usize) {
            let _ = ch.pwm.set_duty_cycle_fully_off();
            ch.angle = None;
        }
    }
}

impl<C: SetDutyCycle> ServoOutput for PwmServo<C> {
    fn channel_count(&self) -> u8 {
        self.channels.len() as u8
    }

    fn set_angle(&mut self, channel: u8, degrees: f32) {
        let angle = self.config.clamp_angle(degrees);
        let Some(max_duty) = self
            .channels
            .get(channel as usize)
            .map(|ch| ch.pwm.max_duty_cycle())
        else {
            return;
        };
        let duty = self.duty_for(max_duty, angle);

        let Some(ch) = self.channels.get_mut(channel as usize) else {
            return;
        };
        match ch.pwm.set_duty_cycle(duty) {
            Ok(()) => ch.angle = Some(angle),
            Err(_) => {
                // Forget the angle so the next identical command is retried
                ch.angle = None;
                #[cfg(feature = "defmt")]
                defmt::warn!("servo {}: PWM write failed", channel);
            }
        }
    }

    fn get_angle(&self, channel: u8) -> Option<f32> {
        self.channels.get(channel as usize).and_then(|ch| ch.angle)
    }
}
