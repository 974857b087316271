//! embedded-hal bus adapter
//!
//! Bridges any `embedded_hal::i2c::I2c` implementation (linux-embedded-hal's
//! `I2cdev` on a Raspberry Pi, an MCU HAL elsewhere) to [`BusTransport`].
//! Register writes are sent as one frame: register pointer followed by data,
//! the same framing SMBus block writes use.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};
use heapless::Vec;

use crate::{errors::TransportError, traits::BusTransport};

/// Largest payload of a single register write (SMBus block limit)
pub const MAX_BLOCK_LEN: usize = 32;

/// Register-oriented view of an embedded-hal I2C bus
#[derive(Debug)]
pub struct I2cBus<I> {
    i2c: I,
}

impl<I: I2c> I2cBus<I> {
    /// Wrap an embedded-hal bus
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Give the underlying bus back
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> BusTransport for I2cBus<I> {
    fn write_block(&mut self, address: u8, register: u8, bytes: &[u8]) -> Result<(), TransportError> {
        let mut frame: Vec<u8, { MAX_BLOCK_LEN + 1 }> = Vec::new();
        // Frame capacity is one more than the block limit, so the pointer byte always fits
        let _ = frame.push(register);
        if frame.extend_from_slice(bytes).is_err() {
            log_warn!("I2C block write of {} bytes exceeds {} byte limit", bytes.len(), MAX_BLOCK_LEN);
            return Err(TransportError::Other);
        }

        self.i2c
            .write(address, &frame)
            .map_err(|e| classify(e.kind()))
    }

    fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), TransportError> {
        self.i2c
            .write_read(address, &[register], buf)
            .map_err(|e| classify(e.kind()))
    }
}

fn classify(kind: ErrorKind) -> TransportError {
    match kind {
        ErrorKind::NoAcknowledge(_) => TransportError::NoAcknowledge,
        ErrorKind::ArbitrationLoss => TransportError::ArbitrationLoss,
        ErrorKind::Bus => TransportError::Bus,
        ErrorKind::Overrun => TransportError::Overrun,
        _ => TransportError::Other,
    }
}
