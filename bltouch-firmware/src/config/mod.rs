//! Configuration loading and parsing
//!
//! The configuration is embedded at build time and parsed by a small
//! no_std parser at boot.

pub mod toml;

pub use toml::{parse_config, FirmwareConfig, ParseError};
