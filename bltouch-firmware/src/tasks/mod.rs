//! Embassy async tasks
//!
//! Each task runs independently and communicates via the statics in
//! [`crate::channels`].

pub mod gcode;
pub mod host_tx;
pub mod probe;

pub use gcode::gcode_task;
pub use host_tx::host_tx_task;
pub use probe::probe_watch_task;
