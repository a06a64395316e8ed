//! Shared state between Embassy tasks
//!
//! Uses embassy-sync primitives for async communication and atomics for
//! the probe line, which the edge watcher updates without locking.

use core::cell::RefCell;
use core::fmt::Write;

use bltouch_core::TriggerLatch;
use bltouch_drivers::ProbeLine;
use bltouch_hal::LogSink;
use embassy_rp::watchdog::Watchdog;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use heapless::String;

/// Longest line sent to the host
pub const HOST_LINE_LEN: usize = 64;

/// Channel capacity for host output lines
const HOST_CHANNEL_SIZE: usize = 16;

pub type HostLine = String<HOST_LINE_LEN>;

/// Probe input level, polarity and armed edges
pub static PROBE_LINE: ProbeLine = ProbeLine::new();

/// Set by the edge watcher when an armed edge arrives
pub static TRIGGER: TriggerLatch = TriggerLatch::new();

/// Lines queued for the host UART
pub static HOST_TX: Channel<CriticalSectionRawMutex, HostLine, HOST_CHANNEL_SIZE> = Channel::new();

/// Watchdog, once started
pub static WATCHDOG: Mutex<CriticalSectionRawMutex, RefCell<Option<Watchdog>>> =
    Mutex::new(RefCell::new(None));

/// Feed the watchdog if it is running
pub fn feed_watchdog() {
    WATCHDOG.lock(|w| {
        if let Some(w) = w.borrow_mut().as_mut() {
            w.feed();
        }
    });
}

/// Queue a status line for the host
pub async fn send_status(status: impl core::fmt::Display) {
    let mut line = HostLine::new();
    // A status always fits
    let _ = write!(line, "{}", status);
    HOST_TX.send(line).await;
}

/// Diagnostic sink that queues lines for the host UART
///
/// Lines are dropped when the queue is full.
pub struct HostLog;

impl LogSink for HostLog {
    fn write_line(&mut self, line: &str) {
        let mut out = HostLine::new();
        for c in line.chars() {
            if out.push(c).is_err() {
                break;
            }
        }
        if HOST_TX.try_send(out).is_err() {
            defmt::warn!("host queue full, dropping line");
        }
    }
}
