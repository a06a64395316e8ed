//! Servo output drivers
//!
//! - PWM hobby servo: angle mapped linearly onto a pulse width

pub mod pwm;

pub use pwm::{PwmServo, ServoError, MAX_SERVOS};
