//! Host stream and housekeeping abstractions

/// Line-oriented diagnostic output
///
/// Writes are best-effort: a sink that cannot deliver a line drops it.
/// Implementations append the line terminator themselves.
pub trait LogSink {
    /// Write one line of text
    fn write_line(&mut self, line: &str);
}

impl<T: LogSink + ?Sized> LogSink for &mut T {
    fn write_line(&mut self, line: &str) {
        (**self).write_line(line)
    }
}

/// Host work that must keep running while the probe waits
///
/// Called repeatedly from inside a settle delay. Typical work: realtime
/// command processing, e-stop polling, watchdog feeding. Must not issue
/// probe commands.
pub trait Housekeeping {
    /// Run one round of housekeeping
    fn run(&mut self);
}

impl<F: FnMut()> Housekeeping for F {
    fn run(&mut self) {
        self()
    }
}
