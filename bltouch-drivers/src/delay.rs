//! Housekeeping-aware delay
//!
//! Wraps a [`DelayNs`] and calls a [`Housekeeping`] hook between slices of
//! a long wait, so things like the watchdog feed or the realtime command
//! poll keep running while the probe settles. A wait never ends early.

use bltouch_hal::Housekeeping;
use embedded_hal_async::delay::DelayNs;

/// Default slice length (ms)
pub const DEFAULT_SLICE_MS: u32 = 10;

/// Delay that services housekeeping while it waits
pub struct HousekeepingDelay<D, H> {
    inner: D,
    housekeeping: H,
    slice_ms: u32,
}

impl<D: DelayNs, H: Housekeeping> HousekeepingDelay<D, H> {
    /// Wrap a delay with the default slice length
    pub fn new(inner: D, housekeeping: H) -> Self {
        Self::with_slice(inner, housekeeping, DEFAULT_SLICE_MS)
    }

    /// Wrap a delay with a custom slice length
    ///
    /// A zero slice is treated as 1 ms.
    pub fn with_slice(inner: D, housekeeping: H, slice_ms: u32) -> Self {
        Self {
            inner,
            housekeeping,
            slice_ms: slice_ms.max(1),
        }
    }
}

impl<D: DelayNs, H: Housekeeping> DelayNs for HousekeepingDelay<D, H> {
    async fn delay_ns(&mut self, ns: u32) {
        let slice_ns = self.slice_ms.saturating_mul(1_000_000);
        let mut remaining = ns;
        while remaining > 0 {
            let step = remaining.min(slice_ns);
            self.inner.delay_ns(step).await;
            self.housekeeping.run();
            remaining -= step;
        }
    }

    async fn delay_us(&mut self, us: u32) {
        let slice_us = self.slice_ms.saturating_mul(1_000);
        let mut remaining = us;
        while remaining > 0 {
            let step = remaining.min(slice_us);
            self.inner.delay_us(step).await;
            self.housekeeping.run();
            remaining -= step;
        }
    }

    async fn delay_ms(&mut self, ms: u32) {
        let mut remaining = ms;
        while remaining > 0 {
            let step = remaining.min(self.slice_ms);
            self.inner.delay_ms(step).await;
            self.housekeeping.run();
            remaining -= step;
        }
    }
}
