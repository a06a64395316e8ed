//! Probe edge watcher task

use defmt::*;
use embassy_rp::gpio::Input;

use bltouch_drivers::watch_edges;

use crate::channels::{PROBE_LINE, TRIGGER};

/// Mirror the probe pin into the shared probe line
#[embassy_executor::task]
pub async fn probe_watch_task(mut pin: Input<'static>) {
    info!("Probe watch task started");

    match watch_edges(&mut pin, &PROBE_LINE, &TRIGGER).await {
        Ok(never) | Err(never) => match never {},
    }
}
