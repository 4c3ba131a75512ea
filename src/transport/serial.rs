// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation of the serial port setup

use serial2_tokio::{CharSize, Parity, SerialPort, Settings, StopBits};
use tracing::{debug, error, info};

use crate::error::{ConcordError, Result};

/// Line speed of the automation module.
pub const BAUD_RATE: u32 = 9600;

/// Open the panel's serial port: 9600 baud, 8 data bits, odd parity, 1 stop bit.
pub fn open(path: &str) -> Result<SerialPort> {
    info!("Opening serial device {} at {} baud", path, BAUD_RATE);

    let port = SerialPort::open(path, |mut settings: Settings| {
        settings.set_raw();
        settings.set_baud_rate(BAUD_RATE)?;
        settings.set_char_size(CharSize::Bits8);
        settings.set_parity(Parity::Odd);
        settings.set_stop_bits(StopBits::One);

        Ok(settings)
    })
    .map_err(|source| {
        error!("Failed to open {}: {}", path, source);
        ConcordError::Open {
            path: path.to_string(),
            source,
        }
    })?;

    // Drop anything buffered before the port was opened
    if let Err(e) = port.discard_buffers() {
        debug!("Could not discard serial buffers: {}", e);
    }

    Ok(port)
}
