//! Diagnostic lines
//!
//! Human-readable messages go to the host stream through [`LogSink`].
//! Lines are formatted into a fixed buffer; anything past it is dropped.

use core::fmt::Write;

use bltouch_hal::LogSink;
use heapless::String;

/// Longest diagnostic line, in bytes
pub const MAX_LINE_LEN: usize = 64;

/// Format a line and hand it to the sink
pub fn emit<L: LogSink + ?Sized>(sink: &mut L, args: core::fmt::Arguments<'_>) {
    let mut line: String<MAX_LINE_LEN> = String::new();
    let _ = line.write_fmt(args);
    sink.write_line(&line);
}
