//! Servo output abstractions
//!
//! A servo channel is commanded by angle. How the angle becomes a pulse
//! width (and which PWM slice carries it) is the implementation's business.

/// Lowest commandable angle in degrees
pub const MIN_ANGLE: f32 = 0.0;

/// Highest commandable angle in degrees
pub const MAX_ANGLE: f32 = 180.0;

/// Multi-channel servo output
///
/// Channels are numbered from 0. Writes to a channel that does not exist
/// are ignored.
pub trait ServoOutput {
    /// Number of channels this output drives
    fn channel_count(&self) -> u8;

    /// Command a channel to an angle in degrees
    ///
    /// Angles outside [`MIN_ANGLE`]..=[`MAX_ANGLE`] are clamped.
    fn set_angle(&mut self, channel: u8, degrees: f32);

    /// Last angle written to a channel
    ///
    /// Returns `None` if the channel has never been commanded (or does
    /// not exist).
    fn get_angle(&self, channel: u8) -> Option<f32>;

    /// Check whether a channel index is valid
    fn has_channel(&self, channel: u8) -> bool {
        channel < self.channel_count()
    }
}

impl<T: ServoOutput + ?Sized> ServoOutput for &mut T {
    fn channel_count(&self) -> u8 {
        (**self).channel_count()
    }

    fn set_angle(&mut self, channel: u8, degrees: f32) {
        (**self).set_angle(channel, degrees)
    }

    fn get_angle(&self, channel: u8) -> Option<f32> {
        (**self).get_angle(channel)
    }
}
