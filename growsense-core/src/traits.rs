//! Core traits for device drivers
//!
//! The bus is the only seam drivers need: everything else (delays, pins) comes
//! from embedded-hal. Keep it simple - register reads and writes against a
//! seven-bit device address.

use crate::errors::TransportError;

/// Raw register access on a shared bus
///
/// Implementations may fail transiently; drivers never retry on their own
/// unless wrapped in [`crate::retry::RetryingBus`].
pub trait BusTransport {
    /// Write `bytes` starting at `register`
    fn write_block(&mut self, address: u8, register: u8, bytes: &[u8]) -> Result<(), TransportError>;

    /// Fill `buf` with bytes read starting at `register`
    fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), TransportError>;

    /// Write a single byte register
    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), TransportError> {
        self.write_block(address, register, &[value])
    }

    /// Read a single byte register
    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, TransportError> {
        let mut buf = [0u8; 1];
        self.read_block(address, register, &mut buf)?;
        Ok(buf[0])
    }
}

impl<T: BusTransport + ?Sized> BusTransport for &mut T {
    fn write_block(&mut self, address: u8, register: u8, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write_block(address, register, bytes)
    }

    fn read_block(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), TransportError> {
        (**self).read_block(address, register, buf)
    }

    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), TransportError> {
        (**self).write_byte(address, register, value)
    }

    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, TransportError> {
        (**self).read_byte(address, register)
    }
}
