//! Retrying Bus Example
//!
//! Runs the LTR-559 startup handshake against a simulated part that NAKs its
//! first few transfers, showing the retry policy absorbing the failures.
//!
//! ## What You'll Learn
//!
//! - Implementing `BusTransport` for a custom bus
//! - How `Ltr559::init` gates reads behind the handshake
//! - Reading attempt counts back from the retrying bus
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_retrying_bus
//! ```

use embedded_hal::delay::DelayNs;
use growsense_core::{
    ltr559::{Ltr559, REG_ALS_DATA, REG_PART_ID},
    BusTransport, SensorError, TransportError,
};

/// Simulated LTR-559 that fails the first `flaky` transfers
struct FlakyLtr559 {
    registers: [u8; 256],
    flaky: u32,
}

impl FlakyLtr559 {
    fn new(flaky: u32) -> Self {
        let mut registers = [0u8; 256];
        registers[REG_PART_ID as usize] = 0x92;
        registers[REG_ALS_DATA as usize..REG_ALS_DATA as usize + 4].copy_from_slice(&[0x40, 0x00, 0x20, 0x01]);
        Self { registers, flaky }
    }

    fn maybe_fail(&mut self) -> Result<(), TransportError> {
        if self.flaky > 0 {
            self.flaky -= 1;
            return Err(TransportError::NoAcknowledge);
        }
        Ok(())
    }
}

impl BusTransport for FlakyLtr559 {
    fn write_block(&mut self, _address: u8, register: u8, bytes: &[u8]) -> Result<(), TransportError> {
        self.maybe_fail()?;
        let start = register as usize;
        self.registers[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn read_block(&mut self, _address: u8, register: u8, buf: &mut [u8]) -> Result<(), TransportError> {
        self.maybe_fail()?;
        let start = register as usize;
        buf.copy_from_slice(&self.registers[start..start + buf.len()]);
        Ok(())
    }
}

/// Prints instead of sleeping
struct LoggingDelay;

impl DelayNs for LoggingDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        println!("  backoff {} ms", ms);
    }
}

fn main() -> Result<(), SensorError> {
    println!("Handshake with 3 NAKs:");
    let mut ltr = Ltr559::init(FlakyLtr559::new(3), LoggingDelay, 0x23)?;
    println!("ready after {} transfer attempts", ltr.attempts_used());

    let (ch0, ch1) = ltr.als_channels()?;
    println!("CH0 = {}, CH1 = {}, lux = {:.2}", ch0, ch1, ltr.lux()?);

    println!("\nHandshake with a dead part:");
    match Ltr559::init(FlakyLtr559::new(u32::MAX), LoggingDelay, 0x23) {
        Err(err) => println!("gave up: {}", err),
        Ok(_) => println!("unexpectedly ready"),
    }

    Ok(())
}
