//! Host UART transmit task
//!
//! Drains queued lines to the host, CRLF terminated.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::HOST_TX;

#[embassy_executor::task]
pub async fn host_tx_task(mut tx: BufferedUartTx) {
    info!("Host TX task started");

    loop {
        let line = HOST_TX.receive().await;
        trace!("TX: {}", line.as_str());

        if let Err(e) = tx.write_all(line.as_bytes()).await {
            warn!("UART write error: {:?}", e);
            continue;
        }
        if let Err(e) = tx.write_all(b"\r\n").await {
            warn!("UART write error: {:?}", e);
        }
    }
}
