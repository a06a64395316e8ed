//! Configuration types
//!
//! Board-agnostic probe and servo settings. Defaults match a stock BLTouch
//! on a hobby servo output.

pub mod types;

pub use types::*;
